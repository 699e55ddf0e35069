//! Frame module — columnar result sets, field lookup, and log/metric classification.

pub mod cache;
pub mod classify;

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineResult;

pub use cache::{FieldCache, FieldRef};
pub use classify::{classify_frames, ClassifiedFrames, FrameRef};

/// Label set attached to a field (series). Ordered so output is deterministic.
pub type Labels = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Time,
    String,
    Number,
    Boolean,
    #[serde(other)]
    Other,
}

/// One typed column of a data frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub values: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Labels>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            field_type,
            values,
            labels: None,
        }
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Cell at `row`, or `Value::Null` when the column is shorter than the frame.
    pub fn value(&self, row: usize) -> &Value {
        self.values.get(row).unwrap_or(&Value::Null)
    }
}

/// A single named query statistic reported by the datasource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStat {
    pub display_name: String,
    pub value: f64,
}

/// Datasource-specific metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Display name of the stat in [`FrameMeta::stats`] that counts processed bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_stat_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_words: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stats: Vec<QueryStat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomMeta>,
}

/// Columnar record batch. All fields share the same length; row `i` across
/// fields is one logical record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<FrameMeta>,
}

impl DataFrame {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            ..Default::default()
        }
    }

    pub fn with_ref_id(mut self, ref_id: impl Into<String>) -> Self {
        self.ref_id = Some(ref_id.into());
        self
    }

    pub fn with_meta(mut self, meta: FrameMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Number of rows, taken from the first field.
    pub fn len(&self) -> usize {
        self.fields.first().map(|f| f.values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn limit(&self) -> Option<u64> {
        self.meta.as_ref().and_then(|m| m.limit)
    }

    pub fn search_words(&self) -> &[String] {
        self.meta.as_ref().map(|m| m.search_words.as_slice()).unwrap_or(&[])
    }

    pub fn custom_error(&self) -> Option<&str> {
        self.meta
            .as_ref()
            .and_then(|m| m.custom.as_ref())
            .and_then(|c| c.error.as_deref())
    }
}

/// Query results as they arrive on the wire: a bare frame array or an
/// object wrapping one under `frames`.
#[derive(Deserialize)]
#[serde(untagged)]
enum FramesPayload {
    Bare(Vec<DataFrame>),
    Wrapped { frames: Vec<DataFrame> },
}

/// Decode frames from JSON.
pub fn parse_frames(json: &str) -> EngineResult<Vec<DataFrame>> {
    let payload: FramesPayload = serde_json::from_str(json)?;
    Ok(match payload {
        FramesPayload::Bare(frames) | FramesPayload::Wrapped { frames } => frames,
    })
}
