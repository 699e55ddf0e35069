//! Row post-processing: adjacent deduplication, level filtering, and sorting.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::text::LogLevel;

use super::row::LogRowModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupStrategy {
    /// Passthrough
    #[default]
    None,
    /// Equal once ISO-8601 timestamps are removed
    Exact,
    /// Equal once all digits are removed
    Numbers,
    /// Equal once all word characters are removed
    Signature,
}

impl DedupStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DedupStrategy::None => "none",
            DedupStrategy::Exact => "exact",
            DedupStrategy::Numbers => "numbers",
            DedupStrategy::Signature => "signature",
        }
    }

    fn normalize<'a>(&self, entry: &'a str) -> Cow<'a, str> {
        match self {
            DedupStrategy::None => Cow::Borrowed(entry),
            DedupStrategy::Exact => ISO_DATE.replace_all(entry, ""),
            DedupStrategy::Numbers => DIGITS.replace_all(entry, ""),
            DedupStrategy::Signature => WORD_CHARS.replace_all(entry, ""),
        }
    }

    /// True if `row` duplicates `previous` under this strategy.
    pub fn is_duplicate(&self, row: &LogRowModel, previous: &LogRowModel) -> bool {
        match self {
            DedupStrategy::None => false,
            strategy => strategy.normalize(&row.entry) == strategy.normalize(&previous.entry),
        }
    }
}

impl fmt::Display for DedupStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DedupStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(DedupStrategy::None),
            "exact" => Ok(DedupStrategy::Exact),
            "numbers" => Ok(DedupStrategy::Numbers),
            "signature" => Ok(DedupStrategy::Signature),
            other => Err(format!("unknown dedup strategy: {}", other)),
        }
    }
}

/// Date, time, optional fractional seconds, optional `Z` or UTC offset.
static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-[01]\d-[0-3]\dT[0-2]\d:[0-5]\d:[0-6]\d(?:[,.]\d+)?(?:[+-][0-2]\d:?[0-5]\d|Z)?")
        .expect("Invalid regex pattern for ISO timestamps")
});

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]").expect("Invalid regex pattern for digits"));

static WORD_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9_]").expect("Invalid regex pattern for word characters"));

/// Collapse each row into its immediate predecessor in the output when the
/// normalized entries match. The first occurrence is kept and its
/// `duplicates` counter incremented; every emitted row starts at 0.
///
/// `None` returns the input untouched (no allocation).
pub fn dedup_log_rows(rows: &[LogRowModel], strategy: DedupStrategy) -> Cow<'_, [LogRowModel]> {
    if strategy == DedupStrategy::None {
        return Cow::Borrowed(rows);
    }

    let mut result: Vec<LogRowModel> = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(previous) = result.last_mut() {
            if strategy.is_duplicate(row, previous) {
                *previous.duplicates.get_or_insert(0) += 1;
                continue;
            }
        }
        let mut kept = row.clone();
        kept.duplicates = Some(0);
        result.push(kept);
    }

    trace!(
        strategy = %strategy,
        input = rows.len(),
        output = result.len(),
        "deduplicated log rows"
    );

    Cow::Owned(result)
}

/// Drop rows whose level is in `hidden`. An empty set borrows the input.
pub fn filter_log_levels<'a>(rows: &'a [LogRowModel], hidden: &HashSet<LogLevel>) -> Cow<'a, [LogRowModel]> {
    if hidden.is_empty() {
        return Cow::Borrowed(rows);
    }
    Cow::Owned(
        rows.iter()
            .filter(|row| !hidden.contains(&row.log_level))
            .cloned()
            .collect(),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogsSortOrder {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for LogsSortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(LogsSortOrder::Ascending),
            "desc" | "descending" => Ok(LogsSortOrder::Descending),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

/// Millisecond time first, nanosecond time as tie-breaker.
pub fn compare_ascending(a: &LogRowModel, b: &LogRowModel) -> Ordering {
    a.time_epoch_ms
        .cmp(&b.time_epoch_ms)
        .then_with(|| a.time_epoch_ns_value().cmp(&b.time_epoch_ns_value()))
}

/// Stable sort in place.
pub fn sort_logs_rows(rows: &mut [LogRowModel], order: LogsSortOrder) {
    match order {
        LogsSortOrder::Ascending => rows.sort_by(compare_ascending),
        LogsSortOrder::Descending => rows.sort_by(|a, b| compare_ascending(b, a)),
    }
}
