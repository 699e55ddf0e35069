//! Summary facts attached to a logs model: common labels, line limit
//! coverage, processed bytes, and the first datasource error.

use std::collections::HashMap;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::frame::{FrameRef, Labels};
use crate::text::ms_range_to_time_string;

pub const COMMON_LABELS: &str = "Common labels";
pub const LIMIT_LABEL: &str = "Line limit";
pub const TOTAL_BYTES_LABEL: &str = "Total bytes processed";
pub const ERROR_LABEL: &str = "Error";

/// Meta payload; the variant is the kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum LogsMetaValue {
    Number(u64),
    String(String),
    LabelsMap(Labels),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogsMetaItem {
    pub label: String,
    #[serde(flatten)]
    pub value: LogsMetaValue,
}

impl LogsMetaItem {
    pub fn new(label: impl Into<String>, value: LogsMetaValue) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Meta entries in display order: common labels, line limit, first error,
/// total bytes processed.
pub fn build_meta(log_frames: &[FrameRef<'_>], common_labels: &Labels) -> Vec<LogsMetaItem> {
    let mut meta = Vec::new();

    if !common_labels.is_empty() {
        meta.push(LogsMetaItem::new(
            COMMON_LABELS,
            LogsMetaValue::LabelsMap(common_labels.clone()),
        ));
    }

    let limit = total_limit(log_frames);
    if limit > 0 {
        meta.push(LogsMetaItem::new(LIMIT_LABEL, LogsMetaValue::Number(limit)));
    }

    // One error is enough; more would flood the meta list
    if let Some(error) = log_frames.iter().find_map(|f| f.frame.custom_error()) {
        meta.push(LogsMetaItem::new(ERROR_LABEL, LogsMetaValue::Error(error.to_string())));
    }

    let total_bytes = total_bytes_processed(log_frames);
    if total_bytes > 0.0 {
        meta.push(LogsMetaItem::new(
            TOTAL_BYTES_LABEL,
            LogsMetaValue::String(format_si_bytes(total_bytes)),
        ));
    }

    meta
}

/// Limits are per query: the last limit seen for each `refId` counts once.
fn total_limit(log_frames: &[FrameRef<'_>]) -> u64 {
    let mut per_query: HashMap<Option<&str>, u64> = HashMap::new();
    for frame_ref in log_frames {
        if let Some(limit) = frame_ref.frame.limit().filter(|l| *l > 0) {
            per_query.insert(frame_ref.frame.ref_id.as_deref(), limit);
        }
    }
    per_query.values().sum()
}

/// Stats are per query: only the first frame of each `refId` is consulted.
fn total_bytes_processed(log_frames: &[FrameRef<'_>]) -> f64 {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut total = 0.0;

    for frame_ref in log_frames {
        let frame = frame_ref.frame;
        let Some(ref_id) = frame.ref_id.as_deref() else {
            continue;
        };
        if !visited.insert(ref_id) {
            continue;
        }
        let Some(meta) = frame.meta.as_ref() else {
            continue;
        };
        let stat_key = meta.custom.as_ref().and_then(|c| c.query_stat_key.as_deref());
        if let Some(key) = stat_key {
            if let Some(stat) = meta.stats.iter().find(|s| s.display_name == key) {
                total += stat.value;
            }
        }
    }

    total
}

/// Decimal SI byte size, e.g. `1.50 kB`.
pub fn format_si_bytes(bytes: f64) -> String {
    const UNITS: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];
    let mut value = bytes;
    let mut unit = 0;
    while value.abs() >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", value.round(), UNITS[0])
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

/// Rewrite the line-limit entry once the histogram pass knows the coverage.
///
/// When exactly `limit` rows came back, the limit was likely hit and the value
/// describes how much of the requested range the rows cover. Otherwise it
/// reports how many rows were returned.
pub fn adjust_meta_info(
    meta: &mut [LogsMetaItem],
    row_count: usize,
    visible_range_ms: Option<i64>,
    requested_range_ms: Option<i64>,
) {
    let Some(item) = meta.iter_mut().find(|m| m.label == LIMIT_LABEL) else {
        return;
    };
    let LogsMetaValue::Number(limit) = &item.value else {
        return;
    };
    let limit = *limit;

    let description = match (visible_range_ms, requested_range_ms) {
        (Some(visible), Some(requested))
            if limit == row_count as u64 && visible != 0 && requested != 0 =>
        {
            let coverage = visible as f64 / requested as f64 * 100.0;
            format!(
                "{} reached, received logs cover {:.2}% ({}) of your selected time range ({})",
                limit,
                coverage,
                ms_range_to_time_string(visible),
                ms_range_to_time_string(requested)
            )
        }
        _ => format!("{} ({} returned)", limit, row_count),
    };

    item.value = LogsMetaValue::String(description);
}
