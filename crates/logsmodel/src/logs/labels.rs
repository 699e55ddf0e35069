//! Common/unique label computation across independently labeled series.

use crate::frame::Labels;

/// Key/value pairs present identically in every label set.
/// An empty input yields an empty set.
pub fn find_common_labels(label_sets: &[&Labels]) -> Labels {
    let Some((first, rest)) = label_sets.split_first() else {
        return Labels::new();
    };

    first
        .iter()
        .filter(|(key, value)| rest.iter().all(|other| other.get(*key) == Some(*value)))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Labels of one series minus the common set.
pub fn find_unique_labels(labels: &Labels, common: &Labels) -> Labels {
    labels
        .iter()
        .filter(|(key, value)| common.get(*key) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
