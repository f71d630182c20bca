//! Lending pool node binary
//!
//! Runs one pool behind the actor with in-memory wallets and a fixed-price
//! oracle, and serves the JSON API of [`lending_core::api`] on the configured
//! listen address.

use anyhow::Context;
use lending_core::{
    api::{self, ApiState},
    spawn_pool_actor,
    types::format_units,
    Config, EventJournal, FixedPriceOracle, InMemoryTransfer, LendingPool, Metrics, SnapshotStore,
};
use std::sync::Arc;

/// Decimals of the settlement asset (wei)
const SETTLEMENT_DECIMALS: u32 = 18;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting lending pool node");

    // Load configuration
    let config = match std::env::var("LENDING_CONFIG") {
        Ok(path) => Config::from_file(&path).with_context(|| format!("loading {}", path))?,
        Err(_) => Config::from_env().context("loading configuration from environment")?,
    };

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        "Configuration loaded"
    );

    let transfer = Arc::new(InMemoryTransfer::new());
    let oracle = Arc::new(FixedPriceOracle::new(config.initial_rate()?));
    let metrics = Metrics::new().context("registering metrics")?;

    let store = if config.snapshot.enabled {
        Some(SnapshotStore::open(&config)?)
    } else {
        None
    };

    // Restore or create pool
    let pool = match store.as_ref().map(|s| s.load()).transpose()?.flatten() {
        Some(snapshot) => LendingPool::restore(snapshot, transfer.clone(), oracle)?,
        None => LendingPool::new(config.protocol.pool_params()?, transfer.clone(), oracle)?,
    }
    .with_metrics(metrics.clone());

    let pool_balance = format_units(pool.pool_balance(), SETTLEMENT_DECIMALS)?;
    tracing::info!(
        administrator = %pool.administrator(),
        collateral_asset = %pool.collateral_asset(),
        price_oracle = %pool.oracle(),
        ltv_ratio = pool.ltv_ratio(),
        pool_balance = %pool_balance,
        "Lending pool ready"
    );

    let handle = spawn_pool_actor(pool, config.actor.mailbox_capacity);

    // HTTP API and metrics
    let app = api::router(ApiState {
        pool: handle.clone(),
        wallets: transfer.clone(),
        metrics,
    });
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "Serving pool API, /health and /metrics");
    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down lending pool node");
    if let Some(store) = &store {
        let snapshot = handle.snapshot().await?;
        store.save(&snapshot)?;

        let journal = EventJournal::from_events(snapshot.events)?;
        let export = store.path().with_file_name("events.jsonl");
        std::fs::write(&export, journal.to_json_lines()?)
            .with_context(|| format!("writing {}", export.display()))?;
        tracing::info!(path = %export.display(), events = journal.len(), "Journal exported");
    }
    handle.shutdown().await?;
    server.abort();

    Ok(())
}
