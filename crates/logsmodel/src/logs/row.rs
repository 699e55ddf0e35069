//! Row materialization: one normalized [`LogRowModel`] per data point of every
//! log-bearing frame.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::frame::{DataFrame, FieldCache, FieldRef, FieldType, FrameRef, Labels};
use crate::text::{
    format_time, format_time_ago, has_ansi_codes, level_from_key, level_from_text,
    level_from_value, strip_ansi_codes, LogLevel, TimeZoneSpec,
};
use crate::text::time::{nanos_from_value, parse_time_value};

use super::labels::{find_common_labels, find_unique_labels};

pub const TIME_NS_FIELD: &str = "tsNs";
pub const LEVEL_FIELD: &str = "level";
pub const ID_FIELD: &str = "id";
pub const LEVEL_LABEL: &str = "level";

/// One materialized log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRowModel {
    /// Index of the source frame in the caller's frame slice.
    pub frame_index: usize,
    /// Column index of the message field within the source frame.
    pub entry_field_index: usize,
    pub row_index: usize,

    /// Display text, ANSI-stripped.
    pub entry: String,
    /// Original text.
    pub raw: String,

    pub time_epoch_ms: i64,
    pub time_epoch_ns: String,
    pub time_from_now: String,
    pub time_local: String,
    pub time_utc: String,

    pub log_level: LogLevel,
    pub labels: Labels,
    pub unique_labels: Labels,
    pub has_ansi: bool,
    pub has_unescaped_content: bool,
    pub search_words: Vec<String>,

    /// Value of the `id` column, else the row index. Not unique across frames.
    pub uid: String,

    /// Set by deduplication; `None` until then.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicates: Option<usize>,
}

impl LogRowModel {
    /// Resolve the back-reference against the frames the model was built from.
    pub fn data_frame<'a>(&self, frames: &'a [DataFrame]) -> Option<&'a DataFrame> {
        frames.get(self.frame_index)
    }

    /// Entry with literal `\n`, `\t`, `\r` sequences turned into control characters.
    pub fn unescaped_entry(&self) -> String {
        if !self.has_unescaped_content {
            return self.entry.clone();
        }
        self.entry
            .replace("\\n", "\n")
            .replace("\\t", "\t")
            .replace("\\r", "\r")
    }

    /// Nanosecond time as a number, for ordering rows within the same millisecond.
    pub fn time_epoch_ns_value(&self) -> i128 {
        self.time_epoch_ns
            .parse::<i128>()
            .unwrap_or(self.time_epoch_ms as i128 * 1_000_000)
    }
}

/// Display settings applied while materializing.
#[derive(Debug, Clone, Copy)]
pub struct RowContext {
    pub time_zone: TimeZoneSpec,
    /// Reference point for relative times.
    pub now_ms: i64,
}

#[derive(Debug, Default)]
pub struct MaterializedRows {
    pub rows: Vec<LogRowModel>,
    pub common_labels: Labels,
    pub has_unique_labels: bool,
}

/// Columns resolved for one log-bearing frame.
struct LogFields<'a> {
    frame: FrameRef<'a>,
    time: FieldRef<'a>,
    string: FieldRef<'a>,
    time_ns: Option<FieldRef<'a>>,
    level: Option<FieldRef<'a>>,
    id: Option<FieldRef<'a>>,
}

impl<'a> LogFields<'a> {
    fn resolve(frame: FrameRef<'a>) -> Option<Self> {
        let cache = FieldCache::new(frame.frame);
        Some(Self {
            frame,
            time: cache.first_field_of_type(FieldType::Time)?,
            string: cache.first_field_of_type(FieldType::String)?,
            time_ns: cache.field_with_name_and_type(TIME_NS_FIELD, FieldType::Time),
            level: cache.field_by_name(LEVEL_FIELD),
            id: cache.field_by_name(ID_FIELD),
        })
    }

    fn labels(&self) -> Option<&'a Labels> {
        self.string.field.labels.as_ref()
    }
}

/// Message text from a loosely typed cell: strings as-is, null as empty,
/// anything else serialized as JSON.
pub fn message_from_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Literal two-character `\n`, `\t`, `\r` sequences (not control characters).
pub fn has_unescaped_content(message: &str) -> bool {
    message.contains("\\n") || message.contains("\\t") || message.contains("\\r")
}

/// Materialize rows frame by frame, row by row, in the given frame order.
/// Rows are not time-sorted here.
pub fn materialize_rows(log_frames: &[FrameRef<'_>], ctx: &RowContext) -> MaterializedRows {
    // Fieldless frames only contribute meta
    let all_fields: Vec<LogFields<'_>> = log_frames
        .iter()
        .filter(|f| !f.frame.fields.is_empty())
        .filter_map(|f| LogFields::resolve(*f))
        .collect();

    // An unlabelled series counts as an empty label set
    let empty = Labels::new();
    let label_sets: Vec<&Labels> = all_fields
        .iter()
        .map(|f| f.labels().unwrap_or(&empty))
        .collect();
    let common_labels = find_common_labels(&label_sets);

    let mut rows = Vec::with_capacity(all_fields.iter().map(|f| f.frame.frame.len()).sum());
    let mut has_unique_labels = false;

    for fields in &all_fields {
        let labels = fields.labels().unwrap_or(&empty);
        let unique_labels = find_unique_labels(labels, &common_labels);
        if !unique_labels.is_empty() && !fields.frame.frame.is_empty() {
            has_unique_labels = true;
        }

        let series_level = labels.get(LEVEL_LABEL).map(|l| level_from_key(l));
        let search_words = fields.frame.frame.search_words().to_vec();
        let mut bad_times = 0usize;

        for row_index in 0..fields.frame.frame.len() {
            let time_epoch_ms = match parse_time_value(fields.time.field.value(row_index)) {
                Some(ms) => ms,
                None => {
                    bad_times += 1;
                    0
                }
            };
            let time_epoch_ns = fields
                .time_ns
                .and_then(|f| nanos_from_value(f.field.value(row_index)))
                .unwrap_or_else(|| format!("{}000000", time_epoch_ms));

            let raw = message_from_value(fields.string.field.value(row_index));
            let has_ansi = has_ansi_codes(&raw);
            let entry = if has_ansi {
                strip_ansi_codes(&raw).into_owned()
            } else {
                raw.clone()
            };

            // Precedence: level column, then series label, then message text
            let log_level = fields
                .level
                .and_then(|f| level_from_value(f.field.value(row_index)))
                .or(series_level)
                .unwrap_or_else(|| level_from_text(&entry));

            let uid = fields
                .id
                .map(|f| f.field.value(row_index))
                .filter(|v| !v.is_null())
                .map(message_from_value)
                .unwrap_or_else(|| row_index.to_string());

            rows.push(LogRowModel {
                frame_index: fields.frame.index,
                entry_field_index: fields.string.index,
                row_index,
                has_unescaped_content: has_unescaped_content(&raw),
                entry,
                raw,
                time_epoch_ms,
                time_epoch_ns,
                time_from_now: format_time_ago(time_epoch_ms, ctx.now_ms),
                time_local: format_time(time_epoch_ms, ctx.time_zone),
                time_utc: format_time(time_epoch_ms, TimeZoneSpec::Utc),
                log_level,
                labels: labels.clone(),
                unique_labels: unique_labels.clone(),
                has_ansi,
                search_words: search_words.clone(),
                uid,
                duplicates: None,
            });
        }

        if bad_times > 0 {
            warn!(
                frame = fields.frame.index,
                rows = bad_times,
                "unparseable time values, falling back to epoch 0"
            );
        }
    }

    debug!(
        frames = all_fields.len(),
        rows = rows.len(),
        common_labels = common_labels.len(),
        "materialized log rows"
    );

    MaterializedRows {
        rows,
        common_labels,
        has_unique_labels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{classify_frames, Field, FrameMeta};
    use serde_json::json;

    const NOW: i64 = 1_700_000_000_000;

    fn ctx() -> RowContext {
        RowContext {
            time_zone: TimeZoneSpec::Utc,
            now_ms: NOW,
        }
    }

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn log_frame(lines: &[&str], times: &[i64], series_labels: Option<Labels>) -> DataFrame {
        let mut line = Field::new("line", FieldType::String, lines.iter().map(|l| json!(l)).collect());
        line.labels = series_labels;
        DataFrame::new(vec![
            Field::new("ts", FieldType::Time, times.iter().map(|t| json!(t)).collect()),
            line,
        ])
    }

    fn materialize(frames: &[DataFrame]) -> MaterializedRows {
        let classified = classify_frames(frames);
        materialize_rows(&classified.logs, &ctx())
    }

    // ── Basic row shape ──────────────────────────────────────────

    #[test]
    fn test_rows_follow_frame_then_row_order() {
        let frames = vec![
            log_frame(&["late", "later"], &[5000, 6000], None),
            log_frame(&["early"], &[1000], None),
        ];
        let out = materialize(&frames);

        let entries: Vec<&str> = out.rows.iter().map(|r| r.entry.as_str()).collect();
        assert_eq!(entries, vec!["late", "later", "early"]);
        assert_eq!(out.rows[2].frame_index, 1);
        assert_eq!(out.rows[2].row_index, 0);
        assert_eq!(out.rows[0].entry_field_index, 1);
    }

    #[test]
    fn test_time_fields() {
        let frames = vec![log_frame(&["hello"], &[1_000], None)];
        let row = &materialize(&frames).rows[0];

        assert_eq!(row.time_epoch_ms, 1_000);
        assert_eq!(row.time_epoch_ns, "1000000000");
        assert_eq!(row.time_utc, "1970-01-01 00:00:01");
        assert_eq!(row.time_local, "1970-01-01 00:00:01");
        assert!(row.time_from_now.ends_with("years ago"));
    }

    #[test]
    fn test_nanosecond_field_used_when_present() {
        let mut frame = log_frame(&["a", "b"], &[1, 2], None);
        frame.fields.push(Field::new(
            "tsNs",
            FieldType::Time,
            vec![json!("1000001"), json!(null)],
        ));
        let out = materialize(&[frame]);

        assert_eq!(out.rows[0].time_epoch_ns, "1000001");
        assert_eq!(out.rows[1].time_epoch_ns, "2000000");
    }

    #[test]
    fn test_data_frame_back_reference() {
        let frames = vec![DataFrame::default(), log_frame(&["a"], &[1], None)];
        let out = materialize(&frames);
        let frame = out.rows[0].data_frame(&frames).expect("frame exists");
        assert_eq!(frame, &frames[1]);
    }

    // ── Message extraction ───────────────────────────────────────

    #[test]
    fn test_non_string_messages_are_serialized() {
        let frame = DataFrame::new(vec![
            Field::new("ts", FieldType::Time, vec![json!(1), json!(2), json!(3)]),
            Field::new(
                "line",
                FieldType::String,
                vec![json!({"msg": "hi"}), json!(null), json!(42)],
            ),
        ]);
        let out = materialize(&[frame]);

        assert_eq!(out.rows[0].raw, r#"{"msg":"hi"}"#);
        assert_eq!(out.rows[1].raw, "");
        assert_eq!(out.rows[2].entry, "42");
    }

    #[test]
    fn test_ansi_entry_stripped_raw_kept() {
        let frames = vec![log_frame(&["\x1b[31mERROR\x1b[0m boom"], &[1], None)];
        let row = &materialize(&frames).rows[0];

        assert!(row.has_ansi);
        assert_eq!(row.entry, "ERROR boom");
        assert_eq!(row.raw, "\x1b[31mERROR\x1b[0m boom");
        assert_eq!(row.log_level, LogLevel::Error);
    }

    #[test]
    fn test_unescaped_content_literal_sequences_only() {
        let frames = vec![log_frame(&["line one\\nline two", "real\nnewline"], &[1, 2], None)];
        let out = materialize(&frames);

        assert!(out.rows[0].has_unescaped_content);
        assert_eq!(out.rows[0].unescaped_entry(), "line one\nline two");
        assert!(!out.rows[1].has_unescaped_content);
        assert_eq!(out.rows[1].unescaped_entry(), "real\nnewline");
    }

    // ── Level precedence ─────────────────────────────────────────

    #[test]
    fn test_level_column_wins() {
        let mut frame = log_frame(
            &["error in text", "error in text"],
            &[1, 2],
            Some(labels(&[("level", "warn")])),
        );
        frame.fields.push(Field::new("level", FieldType::String, vec![json!("debug"), json!(null)]));
        let out = materialize(&[frame]);

        assert_eq!(out.rows[0].log_level, LogLevel::Debug);
        // Empty level cell falls through to the series label
        assert_eq!(out.rows[1].log_level, LogLevel::Warning);
    }

    #[test]
    fn test_series_label_beats_text() {
        let frames = vec![log_frame(&["error happened"], &[1], Some(labels(&[("level", "info")])))];
        assert_eq!(materialize(&frames).rows[0].log_level, LogLevel::Info);
    }

    #[test]
    fn test_text_detection_and_unknown_default() {
        let frames = vec![log_frame(&["WARN slow query", "nothing to see"], &[1, 2], None)];
        let out = materialize(&frames);
        assert_eq!(out.rows[0].log_level, LogLevel::Warning);
        assert_eq!(out.rows[1].log_level, LogLevel::Unknown);
    }

    // ── Labels ───────────────────────────────────────────────────

    #[test]
    fn test_common_and_unique_labels() {
        let frames = vec![
            log_frame(&["a"], &[1], Some(labels(&[("job", "a"), ("env", "p")]))),
            log_frame(&["b"], &[2], Some(labels(&[("job", "b"), ("env", "p")]))),
        ];
        let out = materialize(&frames);

        assert_eq!(out.common_labels, labels(&[("env", "p")]));
        assert!(out.has_unique_labels);
        assert_eq!(out.rows[0].unique_labels, labels(&[("job", "a")]));
        assert_eq!(out.rows[1].unique_labels, labels(&[("job", "b")]));
        assert_eq!(out.rows[1].labels, labels(&[("job", "b"), ("env", "p")]));
    }

    #[test]
    fn test_identical_labels_have_no_unique() {
        let frames = vec![
            log_frame(&["a"], &[1], Some(labels(&[("env", "p")]))),
            log_frame(&["b"], &[2], Some(labels(&[("env", "p")]))),
        ];
        let out = materialize(&frames);
        assert!(!out.has_unique_labels);
        assert!(out.rows.iter().all(|r| r.unique_labels.is_empty()));
    }

    #[test]
    fn test_unlabelled_series_empties_common_labels() {
        let frames = vec![
            log_frame(&["a"], &[1], Some(labels(&[("env", "p")]))),
            log_frame(&["b"], &[2], None),
        ];
        let out = materialize(&frames);

        assert!(out.common_labels.is_empty());
        assert!(out.has_unique_labels);
        for row in &out.rows {
            let mut rebuilt = out.common_labels.clone();
            rebuilt.extend(row.unique_labels.clone());
            assert_eq!(rebuilt, row.labels);
        }
        assert_eq!(out.rows[0].unique_labels, labels(&[("env", "p")]));
        assert!(out.rows[1].unique_labels.is_empty());
    }

    #[test]
    fn test_unique_labels_on_rowless_series_ignored() {
        let frames = vec![
            log_frame(&["a"], &[1], Some(labels(&[("env", "p")]))),
            log_frame(&[], &[], Some(labels(&[("env", "p"), ("job", "x")]))),
        ];
        let out = materialize(&frames);

        assert_eq!(out.common_labels, labels(&[("env", "p")]));
        assert_eq!(out.rows.len(), 1);
        assert!(!out.has_unique_labels);
    }

    // ── uid and search words ─────────────────────────────────────

    #[test]
    fn test_uid_from_id_field_or_index() {
        let mut with_id = log_frame(&["a", "b"], &[1, 2], None);
        with_id.fields.push(Field::new("id", FieldType::String, vec![json!("x-1"), json!(7)]));
        let without_id = log_frame(&["c"], &[3], None);
        let out = materialize(&[with_id, without_id]);

        assert_eq!(out.rows[0].uid, "x-1");
        assert_eq!(out.rows[1].uid, "7");
        assert_eq!(out.rows[2].uid, "0");
    }

    #[test]
    fn test_search_words_from_meta() {
        let frame = log_frame(&["foo bar"], &[1], None).with_meta(FrameMeta {
            search_words: vec!["foo".to_string()],
            ..Default::default()
        });
        let out = materialize(&[frame]);
        assert_eq!(out.rows[0].search_words, vec!["foo".to_string()]);
    }

    #[test]
    fn test_unparseable_time_degrades_to_zero() {
        let frame = DataFrame::new(vec![
            Field::new("ts", FieldType::Time, vec![json!("not a time")]),
            Field::new("line", FieldType::String, vec![json!("x")]),
        ]);
        let out = materialize(&[frame]);
        assert_eq!(out.rows[0].time_epoch_ms, 0);
    }

    #[test]
    fn test_fieldless_frame_contributes_no_rows() {
        let out = materialize(&[DataFrame::default()]);
        assert!(out.rows.is_empty());
        assert!(out.common_labels.is_empty());
        assert!(!out.has_unique_labels);
    }
}
