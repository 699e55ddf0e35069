//! Load — config loading from file and environment variables.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::model::EngineConfig;

pub const CONFIG_FILE_ENV: &str = "LOGSMODEL_CONFIG_FILE";
pub const DEFAULT_CONFIG_FILE: &str = "logsmodel.toml";

impl EngineConfig {
    /// Load configuration from file, then apply environment overrides.
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> EngineResult<Self> {
        let config_path = std::env::var(CONFIG_FILE_ENV)
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &str) -> EngineResult<Self> {
        let mut config = if Path::new(config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(config_path)?
        } else {
            tracing::debug!("Config file not found at {}, using defaults", config_path);
            Self::default()
        };

        config.apply_env()?;
        config.validate().map_err(EngineError::Config)?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> EngineResult<Self> {
        let contents = fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Environment variables override file settings.
    /// Malformed values are configuration errors rather than silently ignored.
    pub fn apply_env(&mut self) -> EngineResult<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> EngineResult<()> {
        if let Some(tz) = var("LOGSMODEL_TIME_ZONE") {
            self.time_zone = tz.parse().map_err(EngineError::Config)?;
        }
        if let Some(px) = var("LOGSMODEL_PX_PER_BAR") {
            self.histogram.px_per_bar = px
                .parse()
                .map_err(|_| EngineError::Config(format!("invalid LOGSMODEL_PX_PER_BAR: {}", px)))?;
        }
        if let Some(min) = var("LOGSMODEL_MIN_BUCKET_MS") {
            self.histogram.min_bucket_ms = min
                .parse()
                .map_err(|_| EngineError::Config(format!("invalid LOGSMODEL_MIN_BUCKET_MS: {}", min)))?;
        }
        if let Some(dedup) = var("LOGSMODEL_DEDUP") {
            self.dedup_strategy = dedup.parse().map_err(EngineError::Config)?;
        }
        Ok(())
    }
}
