//! Frame classification: split query results into log-bearing and metric-bearing frames.

use tracing::debug;

use super::{DataFrame, FieldCache, FieldType};

/// A frame together with its position in the caller's input slice.
///
/// The position is the handle rows keep as their back-reference, so the
/// caller owns the frames and the model only holds indices into them.
#[derive(Debug, Clone, Copy)]
pub struct FrameRef<'a> {
    pub index: usize,
    pub frame: &'a DataFrame,
}

#[derive(Debug, Default)]
pub struct ClassifiedFrames<'a> {
    pub logs: Vec<FrameRef<'a>>,
    pub metrics: Vec<FrameRef<'a>>,
}

impl ClassifiedFrames<'_> {
    pub fn has_logs(&self) -> bool {
        !self.logs.is_empty()
    }
}

/// A frame carries logs if it has no fields at all (kept for its meta:
/// limit, error) or has both a time field and a string field.
pub fn is_log_frame(frame: &DataFrame) -> bool {
    if frame.fields.is_empty() {
        return true;
    }
    let cache = FieldCache::new(frame);
    cache.has_field_of_type(FieldType::Time) && cache.has_field_of_type(FieldType::String)
}

/// Partition frames, preserving input order within each bucket.
/// Field-bearing frames with zero rows that are not logs are dropped.
pub fn classify_frames(frames: &[DataFrame]) -> ClassifiedFrames<'_> {
    let mut classified = ClassifiedFrames::default();

    for (index, frame) in frames.iter().enumerate() {
        let frame_ref = FrameRef { index, frame };
        if is_log_frame(frame) {
            classified.logs.push(frame_ref);
        } else if frame.len() > 0 {
            classified.metrics.push(frame_ref);
        }
    }

    debug!(
        total = frames.len(),
        logs = classified.logs.len(),
        metrics = classified.metrics.len(),
        "classified data frames"
    );

    classified
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{Field, FrameMeta};
    use serde_json::json;

    fn log_frame() -> DataFrame {
        DataFrame::new(vec![
            Field::new("ts", FieldType::Time, vec![json!(1000), json!(2000)]),
            Field::new("line", FieldType::String, vec![json!("a"), json!("b")]),
        ])
    }

    fn metric_frame(rows: usize) -> DataFrame {
        DataFrame::new(vec![
            Field::new("ts", FieldType::Time, (0..rows).map(|i| json!(i * 1000)).collect()),
            Field::new("value", FieldType::Number, (0..rows).map(|i| json!(i)).collect()),
        ])
    }

    #[test]
    fn test_log_frame_needs_time_and_string() {
        assert!(is_log_frame(&log_frame()));
        assert!(!is_log_frame(&metric_frame(2)));

        let only_string = DataFrame::new(vec![Field::new("line", FieldType::String, vec![json!("a")])]);
        assert!(!is_log_frame(&only_string));
    }

    #[test]
    fn test_fieldless_frame_is_log_bearing() {
        let frame = DataFrame::default().with_meta(FrameMeta {
            limit: Some(100),
            ..Default::default()
        });
        let frames = vec![frame];
        let classified = classify_frames(&frames);
        assert_eq!(classified.logs.len(), 1);
        assert!(classified.metrics.is_empty());
    }

    #[test]
    fn test_zero_row_metric_frame_dropped() {
        let frames = vec![metric_frame(0), metric_frame(3)];
        let classified = classify_frames(&frames);
        assert!(classified.logs.is_empty());
        assert_eq!(classified.metrics.len(), 1);
        assert_eq!(classified.metrics[0].index, 1);
    }

    #[test]
    fn test_order_preserved_within_buckets() {
        let frames = vec![log_frame(), metric_frame(1), log_frame().with_ref_id("B"), metric_frame(2)];
        let classified = classify_frames(&frames);

        let log_indices: Vec<usize> = classified.logs.iter().map(|f| f.index).collect();
        let metric_indices: Vec<usize> = classified.metrics.iter().map(|f| f.index).collect();
        assert_eq!(log_indices, vec![0, 2]);
        assert_eq!(metric_indices, vec![1, 3]);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let frames = vec![log_frame(), metric_frame(2), DataFrame::default()];
        let classified = classify_frames(&frames);

        for frame_ref in &classified.logs {
            let alone = vec![frame_ref.frame.clone()];
            let again = classify_frames(&alone);
            assert_eq!(again.logs.len(), 1);
            assert_eq!(again.logs[0].frame, frame_ref.frame);
            assert!(again.metrics.is_empty());
        }
    }
}
