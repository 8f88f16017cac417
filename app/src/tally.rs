// ==============================================================================
// tally.rs - Categorical Value Counts
// ==============================================================================
// Description: Project, response and sex tallies over filtered samples
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use serde::Serialize;
use std::collections::HashMap;

use crate::metrics::DerivedSample;

/// Number of samples carrying one categorical value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

/// Count occurrences of each value, most frequent first (ties by label)
pub fn value_counts<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<CategoryCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut tally: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(label, count)| CategoryCount {
            label: label.to_string(),
            count,
        })
        .collect();
    tally.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    tally
}

pub fn project_counts(samples: &[&DerivedSample]) -> Vec<CategoryCount> {
    value_counts(samples.iter().map(|s| s.record.project_id.as_str()))
}

/// Responder tally; samples without a recorded response are not counted
pub fn response_counts(samples: &[&DerivedSample]) -> Vec<CategoryCount> {
    value_counts(
        samples
            .iter()
            .filter_map(|s| s.record.response.map(|r| r.as_str())),
    )
}

pub fn sex_counts(samples: &[&DerivedSample]) -> Vec<CategoryCount> {
    value_counts(samples.iter().map(|s| s.record.sex.as_str()))
}
