// ==============================================================================
// summary.rs - Population Frequency Summary Table
// ==============================================================================
// Description: Long-form (sample, population) rows for the summary table
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use serde::Serialize;

use crate::metrics::{round_half_even, DerivedSample};
use crate::models::Population;

/// One (sample, population) row of the summary table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    #[serde(rename = "Sample")]
    pub sample: String,

    #[serde(rename = "Total")]
    pub total: u64,

    #[serde(rename = "Population")]
    pub population: Population,

    #[serde(rename = "PopulationCounts")]
    pub population_counts: u32,

    /// Percentage of the sample total, rounded to 2 decimals
    #[serde(rename = "Frequency")]
    pub frequency: f64,
}

/// Pivot filtered samples into five rows each, one per population.
///
/// Rows are grouped by sample (filter order), populations in column order.
pub fn summarize(samples: &[&DerivedSample]) -> Vec<SummaryRow> {
    samples
        .iter()
        .flat_map(|sample| {
            sample.record.counts.iter().map(move |(population, count)| SummaryRow {
                sample: sample.sample_id().to_string(),
                total: sample.total,
                population,
                population_counts: count,
                frequency: round_half_even(f64::from(count) / sample.total as f64 * 100.0, 2),
            })
        })
        .collect()
}
