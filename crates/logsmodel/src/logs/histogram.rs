//! Log volume histogram: bucket sizing and per-level zero-filled series.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::text::{LogLevel, TimeZoneSpec};

use super::row::LogRowModel;

/// Pixels per rendered bar.
pub const DEFAULT_PX_PER_BAR: u32 = 20;
/// Smallest bucket; keeps bars readable on short ranges.
pub const DEFAULT_MIN_BUCKET_MS: i64 = 1000;
/// Histogram series render on the secondary axis.
pub const HISTOGRAM_Y_AXIS_INDEX: u8 = 1;

/// Absolute time window in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: i64,
    pub to: i64,
}

impl TimeRange {
    pub fn new(from: i64, to: i64) -> Self {
        Self { from, to }
    }

    pub fn duration_ms(&self) -> i64 {
        self.to.saturating_sub(self.from)
    }
}

/// Result of sizing the buckets against the requested window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucketing {
    pub bucket_size: i64,
    pub visible_range: Option<TimeRange>,
    pub visible_range_ms: Option<i64>,
    pub requested_range_ms: Option<i64>,
}

/// Size the buckets for `sorted_rows`.
///
/// The base size is `interval_ms * px_per_bar`, at least `min_bucket_ms`.
/// With a requested range, the interval is scaled down to the part of the
/// range the rows actually cover (earliest row to `range.to`) and the visible
/// range starts at the earliest row snapped down to a bucket boundary. Rows
/// starting at or after `range.to` leave the requested range as-is and report
/// `visible_range_ms = 1` so coverage math never divides by zero.
pub fn compute_bucketing(
    sorted_rows: &[LogRowModel],
    interval_ms: f64,
    requested_range: Option<TimeRange>,
    px_per_bar: u32,
    min_bucket_ms: i64,
) -> Bucketing {
    let px_per_bar = px_per_bar as f64;
    let min_bucket_ms = min_bucket_ms.max(1);
    let mut bucketing = Bucketing {
        bucket_size: bucket_size_for(interval_ms, px_per_bar, min_bucket_ms),
        visible_range: requested_range,
        visible_range_ms: None,
        requested_range_ms: None,
    };

    let (Some(range), Some(earliest)) = (requested_range, sorted_rows.first()) else {
        return bucketing;
    };

    let earliest_ms = earliest.time_epoch_ms;
    let requested_range_ms = range.duration_ms();
    let visible_range_ms = range.to.saturating_sub(earliest_ms);
    bucketing.requested_range_ms = Some(requested_range_ms);

    if visible_range_ms > 0 && requested_range_ms > 0 {
        let clamping_factor = visible_range_ms as f64 / requested_range_ms as f64;
        let bucket_size = bucket_size_for(interval_ms * clamping_factor, px_per_bar, min_bucket_ms);
        let adjusted_earliest = bucket_start(earliest_ms, bucket_size);

        bucketing.bucket_size = bucket_size;
        bucketing.visible_range = Some(TimeRange::new(adjusted_earliest, range.to));
        bucketing.visible_range_ms = Some(visible_range_ms);
    } else {
        // Some datasources round the range, so rows can land outside it.
        bucketing.visible_range_ms = Some(1);
    }

    bucketing
}

/// Start of the bucket holding `time_ms`. Saturates at `i64::MIN` when the
/// floor is not representable.
fn bucket_start(time_ms: i64, bucket_size: i64) -> i64 {
    time_ms.saturating_sub(time_ms.rem_euclid(bucket_size))
}

fn bucket_size_for(interval_ms: f64, px_per_bar: f64, min_bucket_ms: i64) -> i64 {
    let scaled = (interval_ms * px_per_bar).ceil();
    if scaled.is_finite() && scaled > min_bucket_ms as f64 {
        scaled as i64
    } else {
        min_bucket_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramPoint {
    pub count: u64,
    pub bucket_start_ms: i64,
}

/// Row counts of one level, one point per bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramSeries {
    pub level: LogLevel,
    pub color: String,
    pub points: Vec<HistogramPoint>,
    pub y_axis_index: u8,
    /// 0: render as bars rather than a continuous line
    pub time_step: i64,
    /// Zone for rendering the bucket timestamps.
    pub time_zone: TimeZoneSpec,
}

impl HistogramSeries {
    pub fn total(&self) -> u64 {
        self.points.iter().map(|p| p.count).sum()
    }

    pub fn bucket_starts(&self) -> Vec<i64> {
        self.points.iter().map(|p| p.bucket_start_ms).collect()
    }
}

/// Running state for one level during the scan.
#[derive(Debug)]
struct SeriesBuilder {
    level: LogLevel,
    points: Vec<HistogramPoint>,
    last_bucket: Option<i64>,
}

impl SeriesBuilder {
    fn new(level: LogLevel) -> Self {
        Self {
            level,
            points: Vec::new(),
            last_bucket: None,
        }
    }

    fn push(&mut self, count: u64, bucket_start_ms: i64) {
        self.points.push(HistogramPoint { count, bucket_start_ms });
        self.last_bucket = Some(bucket_start_ms);
    }

    fn count(&mut self, bucket_start_ms: i64) {
        if self.last_bucket == Some(bucket_start_ms) {
            if let Some(last) = self.points.last_mut() {
                last.count += 1;
                return;
            }
        }
        self.push(1, bucket_start_ms);
    }

    fn finish(mut self, time_zone: TimeZoneSpec) -> HistogramSeries {
        self.points.sort_by_key(|p| p.bucket_start_ms);
        HistogramSeries {
            level: self.level,
            color: self.level.color().to_string(),
            points: self.points,
            y_axis_index: HISTOGRAM_Y_AXIS_INDEX,
            time_step: 0,
            time_zone,
        }
    }
}

/// Level → builder, insertion order preserved.
#[derive(Debug, Default)]
struct SeriesByLevel {
    builders: Vec<SeriesBuilder>,
    index: HashMap<LogLevel, usize>,
}

impl SeriesByLevel {
    /// Builder for `level`, created with zero points for every bucket seen so far.
    fn get_or_create(&mut self, level: LogLevel, seen_buckets: &BTreeSet<i64>) -> usize {
        if let Some(&i) = self.index.get(&level) {
            return i;
        }
        let mut builder = SeriesBuilder::new(level);
        for &bucket in seen_buckets {
            builder.push(0, bucket);
        }
        self.builders.push(builder);
        let i = self.builders.len() - 1;
        self.index.insert(level, i);
        i
    }

    /// Every series other than `current` gets a zero at `bucket` unless already there.
    fn zero_fill_others(&mut self, current: usize, bucket: i64) {
        for (i, other) in self.builders.iter_mut().enumerate() {
            if i != current && other.last_bucket != Some(bucket) {
                other.push(0, bucket);
            }
        }
    }
}

/// Either every series has points or none does. With back-fill and forward
/// zero-fill over sorted rows a series is never left empty, so this only
/// trips when a builder bypasses [`SeriesByLevel::get_or_create`].
fn ensure_all_filled(builders: &[SeriesBuilder]) -> EngineResult<()> {
    if builders.iter().all(|b| b.points.is_empty()) {
        return Ok(());
    }
    match builders.iter().find(|b| b.points.is_empty()) {
        Some(empty) => Err(EngineError::EmptyHistogramSeries { level: empty.level }),
        None => Ok(()),
    }
}

/// One zero-filled series per level present in `sorted_rows`, all sharing the
/// same bucket timestamps so they can be stacked.
pub fn build_series(
    sorted_rows: &[LogRowModel],
    bucket_size: i64,
    time_zone: TimeZoneSpec,
) -> EngineResult<Vec<HistogramSeries>> {
    if bucket_size <= 0 {
        return Err(EngineError::InvalidInput(format!(
            "bucket size must be positive, got {}",
            bucket_size
        )));
    }

    let mut series = SeriesByLevel::default();
    let mut seen_buckets: BTreeSet<i64> = BTreeSet::new();

    for row in sorted_rows {
        let bucket = bucket_start(row.time_epoch_ms, bucket_size);
        let current = series.get_or_create(row.log_level, &seen_buckets);
        series.builders[current].count(bucket);
        seen_buckets.insert(bucket);
        series.zero_fill_others(current, bucket);
    }

    ensure_all_filled(&series.builders)?;

    debug!(
        levels = series.builders.len(),
        buckets = seen_buckets.len(),
        bucket_size,
        "built log volume histogram"
    );

    Ok(series
        .builders
        .into_iter()
        .map(|b| b.finish(time_zone))
        .collect())
}
