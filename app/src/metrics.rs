// ==============================================================================
// metrics.rs - Derived Sample Metrics
// ==============================================================================
// Description: Per-sample totals and population frequencies
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;
use tracing::info;

use crate::models::{Population, SampleRecord};
use crate::snapshot::Snapshot;

/// Errors raised while deriving sample metrics
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    #[error("Sample {sample_id} has a total cell count of zero; frequencies are undefined")]
    ZeroTotal { sample_id: String },

    #[error("Sample {sample_id} appears more than once")]
    DuplicateSample { sample_id: String },
}

/// Frequency of one population within one sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationFrequency {
    pub population: Population,
    pub count: u32,
    /// count / total, in [0, 1]
    pub frequency: f64,
    /// Display form, e.g. "120 (12.0%)"
    pub text: String,
}

/// Sample record augmented with its total and population frequencies
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedSample {
    #[serde(flatten)]
    pub record: SampleRecord,
    pub total: u64,
    frequencies: [PopulationFrequency; 5],
}

impl DerivedSample {
    pub fn sample_id(&self) -> &str {
        &self.record.sample_id
    }

    pub fn frequency(&self, population: Population) -> f64 {
        self.frequencies[population.index()].frequency
    }

    pub fn frequency_text(&self, population: Population) -> &str {
        &self.frequencies[population.index()].text
    }

    /// Frequencies in `Population::ALL` order
    pub fn frequencies(&self) -> &[PopulationFrequency] {
        &self.frequencies
    }
}

/// Round half to even at the given number of decimals (NumPy `round` semantics)
pub fn round_half_even(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

/// Render a float the way the dashboard displays numbers: shortest
/// round-trip digits, with integral values keeping one decimal ("50.0").
pub fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Compute the total and per-population frequencies of one sample
pub fn derive_sample(record: SampleRecord) -> Result<DerivedSample, MetricsError> {
    let total = record.counts.total();
    if total == 0 {
        return Err(MetricsError::ZeroTotal {
            sample_id: record.sample_id,
        });
    }

    let frequencies = Population::ALL.map(|population| {
        let count = record.counts.get(population);
        let frequency = f64::from(count) / total as f64;
        let percentage = round_half_even(frequency * 100.0, 2);
        PopulationFrequency {
            population,
            count,
            frequency,
            text: format!("{} ({}%)", count, format_decimal(percentage)),
        }
    });

    Ok(DerivedSample {
        record,
        total,
        frequencies,
    })
}

/// Derive metrics for every record and freeze them into a snapshot.
///
/// The first malformed record aborts the build.
pub fn build_snapshot(records: Vec<SampleRecord>) -> Result<Snapshot, MetricsError> {
    let mut seen = HashSet::with_capacity(records.len());
    let mut samples = Vec::with_capacity(records.len());

    for record in records {
        if !seen.insert(record.sample_id.clone()) {
            return Err(MetricsError::DuplicateSample {
                sample_id: record.sample_id,
            });
        }
        samples.push(derive_sample(record)?);
    }

    info!("Derived frequencies for {} samples", samples.len());
    Ok(Snapshot::from_derived(samples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellCounts, Response};

    fn record(id: &str, counts: CellCounts) -> SampleRecord {
        SampleRecord {
            sample_id: id.to_string(),
            sample_type: "PBMC".to_string(),
            time_from_treatment_start: Some(0),
            counts,
            subject_id: format!("sbj-{id}"),
            condition: "melanoma".to_string(),
            age: 60,
            sex: "M".to_string(),
            treatment: "tr1".to_string(),
            response: Some(Response::No),
            project_id: "prj1".to_string(),
        }
    }

    fn counts(values: [u32; 5]) -> CellCounts {
        CellCounts {
            b_cell: values[0],
            cd8_t_cell: values[1],
            cd4_t_cell: values[2],
            nk_cell: values[3],
            monocyte: values[4],
        }
    }

    #[test]
    fn test_total_and_frequencies() {
        let derived = derive_sample(record("s1", counts([120, 300, 280, 100, 200]))).unwrap();

        assert_eq!(derived.total, 1000);
        assert!((derived.frequency(Population::BCell) - 0.12).abs() < 1e-12);
        assert!((derived.frequency(Population::Cd8TCell) - 0.30).abs() < 1e-12);
        assert_eq!(derived.frequency_text(Population::BCell), "120 (12.0%)");
        assert_eq!(derived.frequency_text(Population::Monocyte), "200 (20.0%)");
    }

    #[test]
    fn test_frequencies_sum_to_one() {
        let samples = [
            [1, 2, 3, 4, 5],
            [36000, 24000, 42000, 6000, 12000],
            [7, 0, 0, 0, 0],
            [333, 333, 333, 1, 0],
        ];
        for (i, values) in samples.iter().enumerate() {
            let derived = derive_sample(record(&format!("s{i}"), counts(*values))).unwrap();
            let total: u64 = values.iter().map(|&v| u64::from(v)).sum();
            assert_eq!(derived.total, total);

            let sum: f64 = derived.frequencies().iter().map(|f| f.frequency).sum();
            assert!((sum - 1.0).abs() < 1e-9, "sum was {sum}");
            for f in derived.frequencies() {
                assert!((0.0..=1.0).contains(&f.frequency));
            }
        }
    }

    #[test]
    fn test_frequency_text_rounds_to_two_decimals() {
        let derived = derive_sample(record("s1", counts([1, 1, 1, 0, 0]))).unwrap();
        assert_eq!(derived.frequency_text(Population::BCell), "1 (33.33%)");
        assert_eq!(derived.frequency_text(Population::NkCell), "0 (0.0%)");
    }

    #[test]
    fn test_zero_total_is_rejected() {
        let err = derive_sample(record("empty", CellCounts::default())).unwrap_err();
        assert_eq!(
            err,
            MetricsError::ZeroTotal {
                sample_id: "empty".to_string()
            }
        );
    }

    #[test]
    fn test_build_snapshot_fails_on_malformed_row() {
        let records = vec![
            record("s1", counts([1, 2, 3, 4, 5])),
            record("s2", CellCounts::default()),
        ];
        assert!(matches!(
            build_snapshot(records),
            Err(MetricsError::ZeroTotal { .. })
        ));
    }

    #[test]
    fn test_build_snapshot_rejects_duplicates() {
        let records = vec![
            record("s1", counts([1, 2, 3, 4, 5])),
            record("s1", counts([5, 4, 3, 2, 1])),
        ];
        assert!(matches!(
            build_snapshot(records),
            Err(MetricsError::DuplicateSample { .. })
        ));
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(round_half_even(12.344, 2), 12.34);
        assert_eq!(round_half_even(0.125, 2), 0.12);
        assert_eq!(round_half_even(0.375, 2), 0.38);
        assert_eq!(round_half_even(2.5, 0), 2.0);
        assert_eq!(round_half_even(0.029857, 4), 0.0299);
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(50.0), "50.0");
        assert_eq!(format_decimal(12.5), "12.5");
        assert_eq!(format_decimal(0.0299), "0.0299");
        assert_eq!(format_decimal(0.0), "0.0");
    }
}
