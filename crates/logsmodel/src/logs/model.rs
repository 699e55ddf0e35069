//! The consolidated logs model and the pipeline that builds it.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conf::HistogramConfig;
use crate::error::EngineResult;
use crate::frame::{classify_frames, DataFrame};
use crate::text::{LogLevel, TimeZoneSpec};

use super::dedup::{sort_logs_rows, LogsSortOrder};
use super::histogram::{build_series, compute_bucketing, HistogramSeries, TimeRange};
use super::meta::{adjust_meta_info, build_meta, LogsMetaItem};
use super::row::{materialize_rows, LogRowModel, RowContext};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsModel {
    pub rows: Vec<LogRowModel>,
    pub has_unique_labels: bool,
    pub meta: Vec<LogsMetaItem>,
    pub series: Vec<HistogramSeries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_range: Option<TimeRange>,
}

impl LogsModel {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.meta.is_empty()
    }

    /// Levels present in the histogram, in series order.
    pub fn levels(&self) -> Vec<LogLevel> {
        self.series.iter().map(|s| s.level).collect()
    }
}

/// Build a logs model from raw query results.
///
/// Rows are materialized from every log-bearing frame. When `interval_ms` is
/// positive and rows exist, rows are sorted ascending, the volume histogram
/// is synthesized and the line-limit meta is rewritten with coverage.
/// Returns an empty model when no frame carries logs.
pub fn build_logs_model(
    frames: &[DataFrame],
    interval_ms: Option<f64>,
    time_zone: TimeZoneSpec,
    requested_range: Option<TimeRange>,
) -> EngineResult<LogsModel> {
    let ctx = RowContext {
        time_zone,
        now_ms: Utc::now().timestamp_millis(),
    };
    build_logs_model_with(frames, interval_ms, requested_range, &HistogramConfig::default(), &ctx)
}

/// [`build_logs_model`] with explicit histogram settings and row context.
pub fn build_logs_model_with(
    frames: &[DataFrame],
    interval_ms: Option<f64>,
    requested_range: Option<TimeRange>,
    histogram: &HistogramConfig,
    ctx: &RowContext,
) -> EngineResult<LogsModel> {
    let classified = classify_frames(frames);
    if !classified.has_logs() {
        debug!(frames = frames.len(), "no log-bearing frames, returning empty model");
        return Ok(LogsModel::default());
    }

    let materialized = materialize_rows(&classified.logs, ctx);
    let mut model = LogsModel {
        meta: build_meta(&classified.logs, &materialized.common_labels),
        rows: materialized.rows,
        has_unique_labels: materialized.has_unique_labels,
        series: Vec::new(),
        visible_range: None,
    };

    let interval_ms = interval_ms.filter(|i| i.is_finite() && *i > 0.0);
    let Some(interval_ms) = interval_ms else {
        return Ok(model);
    };
    if model.rows.is_empty() {
        return Ok(model);
    }

    sort_logs_rows(&mut model.rows, LogsSortOrder::Ascending);
    let bucketing = compute_bucketing(
        &model.rows,
        interval_ms,
        requested_range,
        histogram.px_per_bar,
        histogram.min_bucket_ms,
    );
    debug!(
        bucket_size = bucketing.bucket_size,
        visible_range_ms = ?bucketing.visible_range_ms,
        requested_range_ms = ?bucketing.requested_range_ms,
        "computed histogram bucketing"
    );

    model.visible_range = bucketing.visible_range;
    model.series = build_series(&model.rows, bucketing.bucket_size, ctx.time_zone)?;
    adjust_meta_info(
        &mut model.meta,
        model.rows.len(),
        bucketing.visible_range_ms,
        bucketing.requested_range_ms,
    );

    Ok(model)
}
