use std::collections::HashMap;
use super::{DataFrame, Field, FieldType};

/// A located field: its column index within the frame plus a borrow of it.
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'a> {
    pub index: usize,
    pub field: &'a Field,
}

/// Per-frame field index
///
/// Indexes a frame's columns once by type and by name so the row
/// materializer does not rescan the field list for every lookup.
/// Read-only: the frame is never mutated. A frame with zero fields
/// simply yields "not found" for every query.
#[derive(Debug)]
pub struct FieldCache<'a> {
    frame: &'a DataFrame,
    /// field type → column indices, in frame order
    by_type: HashMap<FieldType, Vec<usize>>,
    /// field name → first column index with that name
    by_name: HashMap<&'a str, usize>,
}

impl<'a> FieldCache<'a> {
    pub fn new(frame: &'a DataFrame) -> Self {
        let mut by_type: HashMap<FieldType, Vec<usize>> = HashMap::new();
        let mut by_name: HashMap<&'a str, usize> = HashMap::new();

        for (index, field) in frame.fields.iter().enumerate() {
            by_type.entry(field.field_type).or_default().push(index);
            // First occurrence wins for duplicate names
            by_name.entry(field.name.as_str()).or_insert(index);
        }

        Self { frame, by_type, by_name }
    }

    fn field_ref(&self, index: usize) -> Option<FieldRef<'a>> {
        self.frame.fields.get(index).map(|field| FieldRef { index, field })
    }

    pub fn first_field_of_type(&self, field_type: FieldType) -> Option<FieldRef<'a>> {
        self.by_type
            .get(&field_type)
            .and_then(|indices| indices.first())
            .and_then(|&i| self.field_ref(i))
    }

    pub fn fields_of_type(&self, field_type: FieldType) -> Vec<FieldRef<'a>> {
        self.by_type
            .get(&field_type)
            .map(|indices| indices.iter().filter_map(|&i| self.field_ref(i)).collect())
            .unwrap_or_default()
    }

    pub fn has_field_of_type(&self, field_type: FieldType) -> bool {
        self.by_type.get(&field_type).map(|v| !v.is_empty()).unwrap_or(false)
    }

    /// Case-sensitive exact match on the field name.
    pub fn field_by_name(&self, name: &str) -> Option<FieldRef<'a>> {
        self.by_name.get(name).and_then(|&i| self.field_ref(i))
    }

    /// True if any field (not only the first of that name) matches both.
    pub fn has_field_with_name_and_type(&self, name: &str, field_type: FieldType) -> bool {
        self.fields_of_type(field_type)
            .iter()
            .any(|f| f.field.name == name)
    }

    /// Field with the given name, but only if it also has the given type.
    pub fn field_with_name_and_type(&self, name: &str, field_type: FieldType) -> Option<FieldRef<'a>> {
        self.fields_of_type(field_type)
            .into_iter()
            .find(|f| f.field.name == name)
    }

    pub fn len(&self) -> usize {
        self.frame.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.fields.is_empty()
    }
}
