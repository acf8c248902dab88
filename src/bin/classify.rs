//! Demo binary: runs ES and NQ classifications against a deterministic
//! in-memory candle source and prints each report as `REPORT_JSON:{...}`,
//! standing in for the out-of-scope persistence sink (§6). Takes no
//! arguments — CLI parsing is out of scope (§1).

use anyhow::Result;
use regime_engine::application::Pipeline;
use regime_engine::config::EngineConfig;
use regime_engine::infrastructure::{MockCandleSource, SystemClock};
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let config = EngineConfig::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    info!("regime-engine {} starting...", env!("CARGO_PKG_VERSION"));
    info!(
        lookback_days_1m = config.lookback_days_1m,
        lookback_days_5m = config.lookback_days_5m,
        "configuration loaded"
    );

    let candle_source = Arc::new(MockCandleSource::new(chrono::Utc::now(), 5800.0));
    let clock = Arc::new(SystemClock);
    let pipeline = Pipeline::new(
        candle_source,
        clock,
        None,
        config.lookback_days_1m,
        config.lookback_days_5m,
    );

    let reports = pipeline.run_all().await?;
    for report in reports {
        println!("REPORT_JSON:{}", serde_json::to_string(&report)?);
    }

    Ok(())
}
