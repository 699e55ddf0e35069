//! Text helpers used while materializing rows: ANSI handling, severity
//! normalization, and time parsing/formatting.

pub mod ansi;
pub mod level;
pub mod time;

pub use ansi::{has_ansi_codes, strip_ansi_codes};
pub use level::{level_from_key, level_from_text, level_from_value, LogLevel};
pub use time::{format_time, format_time_ago, ms_range_to_time_string, TimeZoneSpec};
