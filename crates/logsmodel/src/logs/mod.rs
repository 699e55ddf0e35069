//! Logs module — row materialization, dedup, histogram, meta, and the model pipeline.

pub mod row;
pub mod labels;
pub mod dedup;
pub mod histogram;
pub mod meta;
pub mod model;

pub use dedup::{dedup_log_rows, filter_log_levels, sort_logs_rows, DedupStrategy, LogsSortOrder};
pub use histogram::{build_series, compute_bucketing, Bucketing, HistogramPoint, HistogramSeries, TimeRange};
pub use meta::{LogsMetaItem, LogsMetaValue};
pub use model::{build_logs_model, build_logs_model_with, LogsModel};
pub use row::{materialize_rows, LogRowModel, RowContext};
