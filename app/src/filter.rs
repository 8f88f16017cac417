// ==============================================================================
// filter.rs - Sample Filter Engine
// ==============================================================================
// Description: Selects samples matching the dashboard filter selections
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Semantics: AND across the four dimensions, OR within one dimension.
// An empty selection in any dimension selects nothing.
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::metrics::DerivedSample;
use crate::snapshot::Snapshot;

/// Selected values for each filter dimension
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSelection {
    pub conditions: BTreeSet<String>,
    pub treatments: BTreeSet<String>,
    pub sample_types: BTreeSet<String>,
    /// Time points; `None` selects samples without a recorded time
    #[serde(rename = "selectedTimes")]
    pub times: BTreeSet<Option<i64>>,
}

impl FilterSelection {
    /// Every distinct value of the snapshot selected (the dashboard's initial state)
    pub fn all(snapshot: &Snapshot) -> Self {
        let options = snapshot.filter_options();
        Self {
            conditions: options.conditions.into_iter().collect(),
            treatments: options.treatments.into_iter().collect(),
            sample_types: options.sample_types.into_iter().collect(),
            times: options.times.into_iter().collect(),
        }
    }

    /// True when at least one dimension has nothing selected
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
            || self.treatments.is_empty()
            || self.sample_types.is_empty()
            || self.times.is_empty()
    }

    pub fn matches(&self, sample: &DerivedSample) -> bool {
        let record = &sample.record;
        self.conditions.contains(&record.condition)
            && self.treatments.contains(&record.treatment)
            && self.sample_types.contains(&record.sample_type)
            && self.times.contains(&record.time_from_treatment_start)
    }
}

/// Samples of the snapshot matching the selection, in snapshot order
pub fn apply<'a>(snapshot: &'a Snapshot, selection: &FilterSelection) -> Vec<&'a DerivedSample> {
    let filtered: Vec<&DerivedSample> = snapshot
        .samples()
        .iter()
        .filter(|sample| selection.matches(sample))
        .collect();

    debug!(
        "Filter selected {} of {} samples",
        filtered.len(),
        snapshot.len()
    );

    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::mixed_snapshot;

    fn ids(samples: &[&DerivedSample]) -> Vec<String> {
        samples.iter().map(|s| s.sample_id().to_string()).collect()
    }

    #[test]
    fn test_all_selected_returns_everything() {
        let snapshot = mixed_snapshot();
        let selection = FilterSelection::all(&snapshot);

        let filtered = apply(&snapshot, &selection);
        assert_eq!(filtered.len(), snapshot.len());
        assert_eq!(ids(&filtered), ids(&snapshot.samples().iter().collect::<Vec<_>>()));
    }

    #[test]
    fn test_any_empty_dimension_selects_nothing() {
        let snapshot = mixed_snapshot();
        let full = FilterSelection::all(&snapshot);

        let mut no_conditions = full.clone();
        no_conditions.conditions.clear();
        let mut no_treatments = full.clone();
        no_treatments.treatments.clear();
        let mut no_types = full.clone();
        no_types.sample_types.clear();
        let mut no_times = full.clone();
        no_times.times.clear();

        for selection in [no_conditions, no_treatments, no_types, no_times, FilterSelection::default()] {
            assert!(selection.is_empty());
            assert!(apply(&snapshot, &selection).is_empty());
        }
    }

    #[test]
    fn test_and_across_or_within_dimensions() {
        let snapshot = mixed_snapshot();
        let mut selection = FilterSelection::all(&snapshot);
        selection.conditions = ["melanoma".to_string(), "carcinoma".to_string()].into();
        selection.sample_types = ["PBMC".to_string()].into();

        let filtered = apply(&snapshot, &selection);
        assert_eq!(ids(&filtered), vec!["s1", "s2", "s3", "s4", "s5"]);
    }

    #[test]
    fn test_null_time_is_selectable() {
        let snapshot = mixed_snapshot();
        let mut selection = FilterSelection::all(&snapshot);
        selection.times = [None].into();

        assert_eq!(ids(&apply(&snapshot, &selection)), vec!["s6"]);

        selection.times = [Some(7)].into();
        assert_eq!(ids(&apply(&snapshot, &selection)), vec!["s2", "s8"]);
    }

    #[test]
    fn test_result_is_subset_of_input() {
        let snapshot = mixed_snapshot();
        let mut selection = FilterSelection::all(&snapshot);
        selection.treatments = ["tr2".to_string(), "unknown".to_string()].into();

        let filtered = apply(&snapshot, &selection);
        assert!(!filtered.is_empty());
        for sample in &filtered {
            assert!(snapshot.get(sample.sample_id()).is_some());
            assert_eq!(sample.record.treatment, "tr2");
        }
    }

    #[test]
    fn test_values_match_exactly() {
        let snapshot = mixed_snapshot();
        let mut selection = FilterSelection::all(&snapshot);
        selection.conditions = ["Melanoma".to_string()].into();
        assert!(apply(&snapshot, &selection).is_empty());
    }

    #[test]
    fn test_selection_json_field_names() {
        let json = r#"{
            "conditions": ["melanoma"],
            "treatments": ["tr1"],
            "sampleTypes": ["PBMC"],
            "selectedTimes": [0, null]
        }"#;
        let selection: FilterSelection = serde_json::from_str(json).unwrap();
        assert!(selection.times.contains(&None));
        assert!(selection.times.contains(&Some(0)));

        let round_trip = serde_json::to_value(&selection).unwrap();
        assert_eq!(round_trip["selectedTimes"], serde_json::json!([null, 0]));
        assert_eq!(round_trip["sampleTypes"], serde_json::json!(["PBMC"]));

        // All four dimensions are required
        let missing = r#"{"conditions": [], "treatments": [], "sampleTypes": []}"#;
        assert!(serde_json::from_str::<FilterSelection>(missing).is_err());
    }
}
