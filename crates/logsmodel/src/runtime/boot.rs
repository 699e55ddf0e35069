//! Boot — logging init and config load.

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::conf::EngineConfig;
use crate::error::EngineResult;

/// Initialise the tracing / logging subsystem.
///
/// Logs go to stderr so stdout stays free for the model output.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logsmodel=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load config (file or env) and log the effective settings.
pub fn boot() -> EngineResult<EngineConfig> {
    let config = EngineConfig::load()?;
    info!(
        "Loaded configuration: time_zone={}, dedup={}, sort={:?}",
        config.time_zone, config.dedup_strategy, config.sort_order
    );
    info!(
        "Histogram: px_per_bar={}, min_bucket_ms={}",
        config.histogram.px_per_bar, config.histogram.min_bucket_ms
    );
    Ok(config)
}
