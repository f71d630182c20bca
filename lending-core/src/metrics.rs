//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the pool.
//!
//! # Metrics
//!
//! - `lending_operations_total{operation}` - Successful state transitions
//! - `lending_rejections_total{code}` - Failed operations by reason code
//! - `lending_pool_balance` - Settlement asset available for borrowing
//! - `lending_outstanding_debt` - Sum of all outstanding loans

use crate::types::Amount;
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone, Debug)]
pub struct Metrics {
    /// Successful operations by name
    pub operations_total: IntCounterVec,

    /// Rejected operations by error code
    pub rejections_total: IntCounterVec,

    /// Pool balance
    pub pool_balance: IntGauge,

    /// Outstanding debt
    pub outstanding_debt: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let operations_total = IntCounterVec::new(
            Opts::new("lending_operations_total", "Successful state transitions"),
            &["operation"],
        )?;
        registry.register(Box::new(operations_total.clone()))?;

        let rejections_total = IntCounterVec::new(
            Opts::new("lending_rejections_total", "Failed operations by reason code"),
            &["code"],
        )?;
        registry.register(Box::new(rejections_total.clone()))?;

        let pool_balance = IntGauge::new(
            "lending_pool_balance",
            "Settlement asset available for borrowing",
        )?;
        registry.register(Box::new(pool_balance.clone()))?;

        let outstanding_debt =
            IntGauge::new("lending_outstanding_debt", "Sum of all outstanding loans")?;
        registry.register(Box::new(outstanding_debt.clone()))?;

        Ok(Self {
            operations_total,
            rejections_total,
            pool_balance,
            outstanding_debt,
            registry,
        })
    }

    /// Record successful operation
    pub fn record_success(&self, operation: &str) {
        self.operations_total.with_label_values(&[operation]).inc();
    }

    /// Record rejected operation
    pub fn record_rejection(&self, code: &str) {
        self.rejections_total.with_label_values(&[code]).inc();
    }

    /// Update balance gauges (saturating at i64::MAX)
    pub fn update_balances(&self, pool_balance: Amount, outstanding_debt: Amount) {
        self.pool_balance.set(clamp_gauge(pool_balance));
        self.outstanding_debt.set(clamp_gauge(outstanding_debt));
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Export all metrics in Prometheus text format
    pub fn export(&self) -> crate::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            crate::Error::Metrics(prometheus::Error::Msg(format!("non-UTF-8 exposition: {}", e)))
        })
    }
}

fn clamp_gauge(value: Amount) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.pool_balance.get(), 0);
        assert_eq!(metrics.outstanding_debt.get(), 0);

        metrics.record_success("lend");
        let names: Vec<String> = metrics
            .registry()
            .gather()
            .iter()
            .map(|mf| mf.get_name().to_string())
            .collect();
        assert!(names.contains(&"lending_operations_total".to_string()));
    }

    #[test]
    fn test_export_text_format() {
        let metrics = Metrics::new().unwrap();
        metrics.update_balances(100, 75);

        let body = metrics.export().unwrap();
        assert!(body.contains("lending_pool_balance 100"));
        assert!(body.contains("lending_outstanding_debt 75"));
    }

    #[test]
    fn test_independent_registries() {
        let first = Metrics::new().unwrap();
        let second = Metrics::new().unwrap();
        first.record_success("lend");
        assert_eq!(first.operations_total.with_label_values(&["lend"]).get(), 1);
        assert_eq!(second.operations_total.with_label_values(&["lend"]).get(), 0);
    }

    #[test]
    fn test_record_rejection() {
        let metrics = Metrics::new().unwrap();
        metrics.record_rejection("LtvExceeded");
        metrics.record_rejection("LtvExceeded");
        assert_eq!(
            metrics
                .rejections_total
                .with_label_values(&["LtvExceeded"])
                .get(),
            2
        );
    }

    #[test]
    fn test_gauges_saturate() {
        let metrics = Metrics::new().unwrap();
        metrics.update_balances(u128::MAX, 25);
        assert_eq!(metrics.pool_balance.get(), i64::MAX);
        assert_eq!(metrics.outstanding_debt.get(), 25);
    }
}
