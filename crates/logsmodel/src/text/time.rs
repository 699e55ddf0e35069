//! Time handling — cell parsing, zone-aware formatting, relative and span strings.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Zone used when rendering timestamps for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeZoneSpec {
    Utc,
    /// Host local zone ("browser" in dashboard terms)
    Local,
    Fixed(FixedOffset),
}

impl Default for TimeZoneSpec {
    fn default() -> Self {
        TimeZoneSpec::Local
    }
}

impl FromStr for TimeZoneSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "utc" | "z" | "gmt" => return Ok(TimeZoneSpec::Utc),
            "" | "browser" | "local" => return Ok(TimeZoneSpec::Local),
            _ => {}
        }
        parse_offset(trimmed)
            .map(TimeZoneSpec::Fixed)
            .ok_or_else(|| format!("unsupported time zone: {}", s))
    }
}

impl TryFrom<String> for TimeZoneSpec {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeZoneSpec> for String {
    fn from(value: TimeZoneSpec) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TimeZoneSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeZoneSpec::Utc => f.write_str("utc"),
            TimeZoneSpec::Local => f.write_str("browser"),
            TimeZoneSpec::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

/// `+HH:MM`, `-HH:MM`, `+HHMM` or `+HH`.
fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.is_empty() || digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = if digits.len() <= 2 {
        (digits.parse::<i32>().ok()?, 0)
    } else {
        let split = digits.len() - 2;
        (digits[..split].parse::<i32>().ok()?, digits[split..].parse::<i32>().ok()?)
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Epoch milliseconds from a time cell: numbers, numeric strings, or RFC 3339.
pub fn parse_time_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64)),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(ms) = s.parse::<i64>() {
                return Some(ms);
            }
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.timestamp_millis())
        }
        _ => None,
    }
}

/// Nanosecond epoch string from a `tsNs` cell; `None` when the cell is empty.
pub fn nanos_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i.to_string()),
            None => n.as_u64().map(|u| u.to_string()).or_else(|| {
                n.as_f64().filter(|f| f.is_finite()).map(|f| format!("{:.0}", f))
            }),
        },
        _ => None,
    }
}

/// `YYYY-MM-DD HH:MM:SS` in the given zone.
pub fn format_time(epoch_ms: i64, zone: TimeZoneSpec) -> String {
    let Some(utc) = Utc.timestamp_millis_opt(epoch_ms).single() else {
        return epoch_ms.to_string();
    };
    match zone {
        TimeZoneSpec::Utc => utc.format(DISPLAY_FORMAT).to_string(),
        TimeZoneSpec::Local => utc.with_timezone(&Local).format(DISPLAY_FORMAT).to_string(),
        TimeZoneSpec::Fixed(offset) => utc.with_timezone(&offset).format(DISPLAY_FORMAT).to_string(),
    }
}

/// Relative description of `epoch_ms` as seen from `now_ms`
/// ("a few seconds ago", "5 minutes ago", "in 2 hours").
pub fn format_time_ago(epoch_ms: i64, now_ms: i64) -> String {
    let delta_ms = now_ms.saturating_sub(epoch_ms);
    let phrase = humanize(delta_ms.unsigned_abs() / 1000);
    if delta_ms >= 0 {
        format!("{} ago", phrase)
    } else {
        format!("in {}", phrase)
    }
}

fn humanize(seconds: u64) -> String {
    let minutes = (seconds as f64 / 60.0).round() as u64;
    let hours = (seconds as f64 / 3600.0).round() as u64;
    let days = (seconds as f64 / 86_400.0).round() as u64;

    match seconds {
        s if s < 45 => "a few seconds".to_string(),
        s if s < 90 => "a minute".to_string(),
        s if s < 45 * 60 => format!("{} minutes", minutes),
        s if s < 90 * 60 => "an hour".to_string(),
        s if s < 22 * 3600 => format!("{} hours", hours),
        s if s < 36 * 3600 => "a day".to_string(),
        s if s < 26 * 86_400 => format!("{} days", days),
        s if s < 45 * 86_400 => "a month".to_string(),
        s if s < 320 * 86_400 => format!("{} months", ((s as f64) / (30.0 * 86_400.0)).round() as u64),
        s if s < 548 * 86_400 => "a year".to_string(),
        s => format!("{} years", ((s as f64) / (365.0 * 86_400.0)).round() as u64),
    }
}

/// Human span such as `1h 2min 3sec`; spans under a second render as `{ms}ms`.
pub fn ms_range_to_time_string(range_ms: i64) -> String {
    if range_ms.unsigned_abs() < 1000 {
        return format!("{}ms", range_ms);
    }

    let range_sec = (range_ms as f64 / 1000.0).round() as i64;
    let h = range_sec / 3600;
    let m = range_sec / 60 - h * 60;
    let s = range_sec % 60;

    let parts: Vec<String> = [(h, "h"), (m, "min"), (s, "sec")]
        .iter()
        .filter(|(value, _)| *value != 0)
        .map(|(value, unit)| format!("{}{}", value, unit))
        .collect();

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ── TimeZoneSpec ─────────────────────────────────────────────

    #[test]
    fn test_zone_parse_named() {
        assert_eq!("utc".parse::<TimeZoneSpec>(), Ok(TimeZoneSpec::Utc));
        assert_eq!("UTC".parse::<TimeZoneSpec>(), Ok(TimeZoneSpec::Utc));
        assert_eq!("browser".parse::<TimeZoneSpec>(), Ok(TimeZoneSpec::Local));
        assert_eq!("".parse::<TimeZoneSpec>(), Ok(TimeZoneSpec::Local));
    }

    #[test]
    fn test_zone_parse_offsets() {
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!("+02:00".parse::<TimeZoneSpec>(), Ok(TimeZoneSpec::Fixed(plus_two)));
        assert_eq!("+0200".parse::<TimeZoneSpec>(), Ok(TimeZoneSpec::Fixed(plus_two)));
        let minus = FixedOffset::west_opt(5 * 3600 + 30 * 60).unwrap();
        assert_eq!("-05:30".parse::<TimeZoneSpec>(), Ok(TimeZoneSpec::Fixed(minus)));
    }

    #[test]
    fn test_zone_parse_rejects_names() {
        assert!("Europe/Berlin".parse::<TimeZoneSpec>().is_err());
        assert!("+25:00".parse::<TimeZoneSpec>().is_err());
    }

    // ── parse_time_value ─────────────────────────────────────────

    #[test]
    fn test_parse_time_value_variants() {
        assert_eq!(parse_time_value(&json!(1500)), Some(1500));
        assert_eq!(parse_time_value(&json!(1500.9)), Some(1500));
        assert_eq!(parse_time_value(&json!("2000")), Some(2000));
        assert_eq!(parse_time_value(&json!("1970-01-01T00:00:01.500Z")), Some(1500));
        assert_eq!(parse_time_value(&json!("yesterday")), None);
        assert_eq!(parse_time_value(&json!(null)), None);
    }

    #[test]
    fn test_nanos_from_value() {
        assert_eq!(nanos_from_value(&json!("1500000001")), Some("1500000001".to_string()));
        assert_eq!(nanos_from_value(&json!(1500000001)), Some("1500000001".to_string()));
        assert_eq!(nanos_from_value(&json!("")), None);
        assert_eq!(nanos_from_value(&json!(null)), None);
    }

    // ── format_time ──────────────────────────────────────────────

    #[test]
    fn test_format_time_utc() {
        assert_eq!(format_time(0, TimeZoneSpec::Utc), "1970-01-01 00:00:00");
        assert_eq!(format_time(1_700_000_000_000, TimeZoneSpec::Utc), "2023-11-14 22:13:20");
    }

    #[test]
    fn test_format_time_fixed_offset() {
        let zone: TimeZoneSpec = "+02:00".parse().unwrap();
        assert_eq!(format_time(0, zone), "1970-01-01 02:00:00");
    }

    // ── format_time_ago ──────────────────────────────────────────

    #[test]
    fn test_time_ago_buckets() {
        let now = 10_000_000_000;
        assert_eq!(format_time_ago(now - 10_000, now), "a few seconds ago");
        assert_eq!(format_time_ago(now - 60_000, now), "a minute ago");
        assert_eq!(format_time_ago(now - 5 * 60_000, now), "5 minutes ago");
        assert_eq!(format_time_ago(now - 3 * 3_600_000, now), "3 hours ago");
        assert_eq!(format_time_ago(now - 24 * 3_600_000, now), "a day ago");
        assert_eq!(format_time_ago(now - 3 * 86_400_000, now), "3 days ago");
    }

    #[test]
    fn test_time_ago_future() {
        let now = 10_000_000_000;
        assert_eq!(format_time_ago(now + 2 * 3_600_000, now), "in 2 hours");
    }

    // ── ms_range_to_time_string ──────────────────────────────────

    #[test]
    fn test_range_string() {
        assert_eq!(ms_range_to_time_string(500), "500ms");
        assert_eq!(ms_range_to_time_string(3_000), "3sec");
        assert_eq!(ms_range_to_time_string(90_000), "1min 30sec");
        assert_eq!(ms_range_to_time_string(3_600_000), "1h");
        assert_eq!(ms_range_to_time_string(3_723_000), "1h 2min 3sec");
        assert_eq!(ms_range_to_time_string(3_603_000), "1h 3sec");
    }

    #[test]
    fn test_range_string_below_one_second() {
        assert_eq!(ms_range_to_time_string(0), "0ms");
        assert_eq!(ms_range_to_time_string(999), "999ms");
        assert_eq!(ms_range_to_time_string(1_000), "1sec");
        assert_eq!(ms_range_to_time_string(1_499), "1sec");
    }
}
