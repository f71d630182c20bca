//! Configuration for the lending pool

use crate::types::{AccountId, Amount, AssetId, OracleId, PoolParams};
use crate::valuation::DEFAULT_LTV_RATIO;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// HTTP listen address (API and metrics)
    pub listen_addr: String,

    /// Construction-time pool parameters
    pub protocol: ProtocolConfig,

    /// Local price feed settings
    pub oracle: OracleConfig,

    /// Actor configuration
    pub actor: ActorConfig,

    /// Snapshot configuration
    pub snapshot: SnapshotConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "lending-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            listen_addr: "0.0.0.0:9090".to_string(),
            protocol: ProtocolConfig::default(),
            oracle: OracleConfig::default(),
            actor: ActorConfig::default(),
            snapshot: SnapshotConfig::default(),
        }
    }
}

/// Pool parameters fixed at creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Administrator identity (may change the LTV ratio)
    pub administrator: String,

    /// Collateral token identity
    pub collateral_asset: String,

    /// Price feed reference
    pub price_oracle: String,

    /// Initial LTV ratio (percent)
    pub ltv_ratio: u64,

    /// Decimals of the oracle's fixed-point rate
    pub price_decimals: u32,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            administrator: "admin".to_string(),
            collateral_asset: "COLL".to_string(),
            price_oracle: "COLL/ETH".to_string(),
            ltv_ratio: DEFAULT_LTV_RATIO,
            price_decimals: 18,
        }
    }
}

impl ProtocolConfig {
    /// Fixed-point scale derived from `price_decimals`
    pub fn price_scale(&self) -> crate::Result<Amount> {
        10u128.checked_pow(self.price_decimals).ok_or_else(|| {
            crate::Error::Config(format!(
                "price_decimals {} is too large",
                self.price_decimals
            ))
        })
    }

    /// Pool parameters described by this section
    pub fn pool_params(&self) -> crate::Result<PoolParams> {
        Ok(PoolParams {
            administrator: AccountId::new(self.administrator.clone()),
            collateral_asset: AssetId::new(self.collateral_asset.clone()),
            price_oracle: OracleId::new(self.price_oracle.clone()),
            price_scale: self.price_scale()?,
            initial_ltv_ratio: self.ltv_ratio,
        })
    }
}

/// Local price feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Settlement-asset value of one collateral unit at startup (e.g. "2500.5")
    pub initial_rate: Decimal,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            initial_rate: Decimal::ONE,
        }
    }
}

impl OracleConfig {
    /// Startup rate as a fixed-point integer with `price_decimals` decimals
    pub fn scaled_rate(&self, price_decimals: u32) -> crate::Result<Amount> {
        let rate = self.initial_rate.normalize();
        if rate.is_sign_negative() {
            return Err(crate::Error::Config(format!(
                "initial_rate {} is negative",
                self.initial_rate
            )));
        }
        if rate.scale() > price_decimals {
            return Err(crate::Error::Config(format!(
                "initial_rate {} has more than {} decimals",
                self.initial_rate, price_decimals
            )));
        }

        let mantissa = u128::try_from(rate.mantissa())
            .map_err(|_| crate::Error::Config("initial_rate out of range".to_string()))?;
        10u128
            .checked_pow(price_decimals - rate.scale())
            .and_then(|factor| mantissa.checked_mul(factor))
            .ok_or_else(|| {
                crate::Error::Config(format!(
                    "initial_rate {} overflows at {} decimals",
                    self.initial_rate, price_decimals
                ))
            })
    }
}

/// Actor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Bounded mailbox capacity
    pub mailbox_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000,
        }
    }
}

/// Snapshot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Directory holding the snapshot file
    pub data_dir: PathBuf,

    /// Restore on start and persist on shutdown
    pub enabled: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/lending"),
            enabled: true,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Oracle rate published at startup, in the protocol's fixed-point scale
    pub fn initial_rate(&self) -> crate::Result<Amount> {
        self.oracle.scaled_rate(self.protocol.price_decimals)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(admin) = std::env::var("LENDING_ADMIN") {
            config.protocol.administrator = admin;
        }

        if let Ok(asset) = std::env::var("LENDING_COLLATERAL_ASSET") {
            config.protocol.collateral_asset = asset;
        }

        if let Ok(oracle) = std::env::var("LENDING_PRICE_ORACLE") {
            config.protocol.price_oracle = oracle;
        }

        if let Ok(ratio) = std::env::var("LENDING_LTV_RATIO") {
            config.protocol.ltv_ratio = ratio
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid LENDING_LTV_RATIO: {}", e)))?;
        }

        if let Ok(rate) = std::env::var("LENDING_ORACLE_RATE") {
            config.oracle.initial_rate = Decimal::from_str(&rate)
                .map_err(|e| crate::Error::Config(format!("Invalid LENDING_ORACLE_RATE: {}", e)))?;
        }

        if let Ok(dir) = std::env::var("LENDING_DATA_DIR") {
            config.snapshot.data_dir = PathBuf::from(dir);
        }

        if let Ok(addr) = std::env::var("LENDING_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the pool cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.protocol.administrator.is_empty() {
            return Err(crate::Error::Config("administrator must be set".to_string()));
        }
        self.protocol.price_scale()?;
        self.initial_rate()?;
        if self.actor.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "mailbox_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "lending-core");
        assert_eq!(config.protocol.ltv_ratio, 75);
        assert_eq!(
            config.protocol.price_scale().unwrap(),
            crate::valuation::DEFAULT_PRICE_SCALE
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            service_name = "lending-core"
            service_version = "0.1.0"
            listen_addr = "127.0.0.1:9100"

            [protocol]
            administrator = "0xadmin"
            collateral_asset = "WBTC"
            price_oracle = "WBTC/ETH"
            ltv_ratio = 60
            price_decimals = 8

            [oracle]
            initial_rate = "15.5"

            [actor]
            mailbox_capacity = 64

            [snapshot]
            data_dir = "/tmp/lending"
            enabled = false
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        config.validate().unwrap();
        let params = config.protocol.pool_params().unwrap();
        assert_eq!(params.administrator, AccountId::new("0xadmin"));
        assert_eq!(params.price_scale, 100_000_000);
        assert_eq!(params.initial_ltv_ratio, 60);
        assert_eq!(config.initial_rate().unwrap(), 1_550_000_000);
        assert!(!config.snapshot.enabled);
    }

    #[test]
    fn test_initial_rate_above_u64_range() {
        let mut config = Config::default();
        assert_eq!(config.initial_rate().unwrap(), crate::valuation::DEFAULT_PRICE_SCALE);

        // 3500.25 at 18 decimals is above u64::MAX
        config.oracle.initial_rate = Decimal::from_str("3500.25").unwrap();
        assert_eq!(
            config.initial_rate().unwrap(),
            3_500_250_000_000_000_000_000
        );
        config.validate().unwrap();
    }

    #[test]
    fn test_initial_rate_precision_checked() {
        let mut config = Config::default();
        config.protocol.price_decimals = 2;
        config.oracle.initial_rate = Decimal::from_str("1.005").unwrap();
        assert!(config.validate().is_err());

        config.oracle.initial_rate = Decimal::from_str("-1").unwrap();
        assert!(config.initial_rate().is_err());
    }

    #[test]
    fn test_oversized_decimals_rejected() {
        let mut config = Config::default();
        config.protocol.price_decimals = 40;
        assert!(config.validate().is_err());
    }
}
