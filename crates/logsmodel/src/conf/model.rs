//! Model — EngineConfig and related structs.

use serde::{Deserialize, Serialize};

use crate::logs::histogram::{DEFAULT_MIN_BUCKET_MS, DEFAULT_PX_PER_BAR};
use crate::logs::{DedupStrategy, LogsSortOrder};
use crate::text::{LogLevel, TimeZoneSpec};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub time_zone: TimeZoneSpec,
    pub dedup_strategy: DedupStrategy,
    pub excluded_levels: Vec<LogLevel>,
    pub sort_order: LogsSortOrder,
    pub histogram: HistogramConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    pub px_per_bar: u32,
    pub min_bucket_ms: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_zone: TimeZoneSpec::Local,
            dedup_strategy: DedupStrategy::None,
            excluded_levels: Vec::new(),
            sort_order: LogsSortOrder::Ascending,
            histogram: HistogramConfig::default(),
        }
    }
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            px_per_bar: DEFAULT_PX_PER_BAR,
            min_bucket_ms: DEFAULT_MIN_BUCKET_MS,
        }
    }
}

impl HistogramConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.px_per_bar == 0 {
            return Err("histogram.px_per_bar must be > 0".to_string());
        }
        if self.min_bucket_ms <= 0 {
            return Err("histogram.min_bucket_ms must be > 0".to_string());
        }
        Ok(())
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.histogram.validate()
    }
}
