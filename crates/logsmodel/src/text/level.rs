//! Severity normalization: key lookup and free-text detection.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
    Trace,
    Unknown,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Critical => "critical",
            LogLevel::Error => "error",
            LogLevel::Warning => "warning",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
            LogLevel::Unknown => "unknown",
        }
    }

    /// Bar color used for this level in the volume histogram.
    pub fn color(&self) -> &'static str {
        match self {
            LogLevel::Critical => "#705da0",
            LogLevel::Error => "#e24d42",
            LogLevel::Warning => "#eab839",
            LogLevel::Info => "#7eb26d",
            LogLevel::Debug => "#1f78c1",
            LogLevel::Trace => "#6ed0e0",
            LogLevel::Unknown => "#8e8e8e",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    /// Strict parse of the canonical names and known aliases; used for config
    /// and CLI input where an unrecognized name is a user error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match level_from_key(s) {
            LogLevel::Unknown if !s.eq_ignore_ascii_case("unknown") => {
                Err(format!("unknown log level: {}", s))
            }
            level => Ok(level),
        }
    }
}

/// Map a level key (label value, level column cell) to a [`LogLevel`].
/// Unrecognized keys map to `Unknown`.
pub fn level_from_key(key: &str) -> LogLevel {
    match key.trim().to_ascii_lowercase().as_str() {
        "emerg" | "fatal" | "alert" | "crit" | "critical" => LogLevel::Critical,
        "err" | "eror" | "error" => LogLevel::Error,
        "warn" | "warning" => LogLevel::Warning,
        "info" | "information" | "informational" | "notice" => LogLevel::Info,
        "dbug" | "debug" => LogLevel::Debug,
        "trace" => LogLevel::Trace,
        _ => LogLevel::Unknown,
    }
}

/// Level key taken from a loosely typed cell. Null and empty cells yield `None`
/// so callers can fall through to the next source of severity.
pub fn level_from_value(value: &Value) -> Option<LogLevel> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(level_from_key(s)),
        Value::Bool(false) => None,
        other => Some(level_from_key(&other.to_string())),
    }
}

/// Whole-word level aliases, case-insensitive.
/// Longer aliases sharing a prefix rely on `\b` to reject the shorter one.
static LEVEL_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(emerg|fatal|alert|crit|critical|err|eror|error|warn|warning|info|information|informational|notice|dbug|debug|trace)\b",
    )
    .expect("Invalid regex pattern for log level words")
});

/// Detect the level from message text: the leftmost level word wins.
pub fn level_from_text(line: &str) -> LogLevel {
    if line.is_empty() {
        return LogLevel::Unknown;
    }
    LEVEL_WORD
        .find(line)
        .map(|m| level_from_key(m.as_str()))
        .unwrap_or(LogLevel::Unknown)
}
