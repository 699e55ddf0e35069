use thiserror::Error;

use crate::text::LogLevel;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A histogram series ended a build pass with no points while another
    /// series in the same pass has some. Only happens on unsorted or empty input.
    #[error("Histogram series for level '{level}' has no data points")]
    EmptyHistogramSeries { level: LogLevel },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
