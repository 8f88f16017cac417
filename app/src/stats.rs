// ==============================================================================
// stats.rs - Responder vs Non-Responder Comparison
// ==============================================================================
// Description: Welch's t-test of population frequencies by treatment response
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Welch's t-test (unequal variances):
//   t  = (mean_a - mean_b) / sqrt(var_a/n_a + var_b/n_b)
//   df = (var_a/n_a + var_b/n_b)^2
//        / ((var_a/n_a)^2/(n_a-1) + (var_b/n_b)^2/(n_b-1))
//   p  = 2 * P(T_df > |t|)
// Sample variances use n-1 in the denominator.
// ==============================================================================

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::{Data, Distribution};
use std::collections::BTreeMap;
use tracing::debug;

use crate::metrics::DerivedSample;
use crate::models::{Population, Response};

/// Minimum group size for a defined sample variance
pub const MIN_GROUP_SIZE: usize = 2;

/// Long-form frequency of one population in one sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyRecord {
    pub sample_id: String,
    pub response: Response,
    pub population: Population,
    pub frequency: f64,
}

/// Result of a completed Welch's t-test
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WelchTest {
    pub statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: f64,
}

/// Outcome of comparing two groups
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TestOutcome {
    Tested(WelchTest),
    /// A group has fewer than `MIN_GROUP_SIZE` members
    InsufficientData,
    /// Both groups are constant, so the standard error is zero
    ZeroVariance,
}

impl TestOutcome {
    pub fn test(&self) -> Option<&WelchTest> {
        match self {
            TestOutcome::Tested(test) => Some(test),
            _ => None,
        }
    }

    pub fn p_value(&self) -> Option<f64> {
        self.test().map(|t| t.p_value)
    }

    pub fn statistic(&self) -> Option<f64> {
        self.test().map(|t| t.statistic)
    }
}

/// Comparison of one population between responders and non-responders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationComparison {
    pub population: Population,
    pub responders: usize,
    pub non_responders: usize,
    pub outcome: TestOutcome,
}

/// Per-population comparisons keyed by population name
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResponseComparison {
    comparisons: BTreeMap<Population, PopulationComparison>,
}

impl ResponseComparison {
    pub fn get(&self, population: Population) -> Option<&PopulationComparison> {
        self.comparisons.get(&population)
    }

    /// Comparisons in `Population::ALL` order
    pub fn iter(&self) -> impl Iterator<Item = &PopulationComparison> {
        self.comparisons.values()
    }

    pub fn len(&self) -> usize {
        self.comparisons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comparisons.is_empty()
    }
}

/// Mean and sample variance (n - 1 denominator) of one group
fn moments(values: &[f64]) -> Option<(f64, f64)> {
    let data = Data::new(values.to_vec());
    Some((data.mean()?, data.variance()?))
}

fn is_constant(values: &[f64]) -> bool {
    values.iter().all(|v| *v == values[0])
}

/// Two-sided Welch's t-test of `a` against `b`.
///
/// A positive statistic means `a` has the larger mean.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> TestOutcome {
    if a.len() < MIN_GROUP_SIZE || b.len() < MIN_GROUP_SIZE {
        return TestOutcome::InsufficientData;
    }

    // Exact check on the raw values, before any arithmetic
    if is_constant(a) && is_constant(b) {
        return TestOutcome::ZeroVariance;
    }

    let (Some((mean_a, var_a)), Some((mean_b, var_b))) = (moments(a), moments(b)) else {
        return TestOutcome::InsufficientData;
    };

    let n_a = a.len() as f64;
    let n_b = b.len() as f64;
    let se_a = var_a / n_a;
    let se_b = var_b / n_b;
    let se_sq = se_a + se_b;

    if se_sq.is_nan() || se_sq <= 0.0 {
        return TestOutcome::ZeroVariance;
    }

    let statistic = (mean_a - mean_b) / se_sq.sqrt();
    let degrees_of_freedom =
        se_sq.powi(2) / (se_a.powi(2) / (n_a - 1.0) + se_b.powi(2) / (n_b - 1.0));

    let distribution = match StudentsT::new(0.0, 1.0, degrees_of_freedom) {
        Ok(distribution) => distribution,
        Err(e) => {
            debug!("Invalid t distribution (df = {}): {}", degrees_of_freedom, e);
            return TestOutcome::InsufficientData;
        }
    };
    let p_value = (2.0 * distribution.sf(statistic.abs())).min(1.0);

    TestOutcome::Tested(WelchTest {
        statistic,
        p_value,
        degrees_of_freedom,
    })
}

/// Reshape samples into one frequency record per (sample, population).
///
/// Samples without a recorded response belong to neither group and are
/// skipped. Records are grouped by population, samples in input order.
pub fn frequency_records(samples: &[&DerivedSample]) -> Vec<FrequencyRecord> {
    Population::ALL
        .iter()
        .flat_map(|&population| {
            samples.iter().filter_map(move |sample| {
                sample.record.response.map(|response| FrequencyRecord {
                    sample_id: sample.sample_id().to_string(),
                    response,
                    population,
                    frequency: sample.frequency(population),
                })
            })
        })
        .collect()
}

/// Compare each population's frequency between responders ("yes") and
/// non-responders ("no").
pub fn compare_responders(samples: &[&DerivedSample]) -> ResponseComparison {
    let comparisons = Population::ALL
        .iter()
        .map(|&population| {
            let mut responders = Vec::new();
            let mut non_responders = Vec::new();
            for sample in samples {
                match sample.record.response {
                    Some(Response::Yes) => responders.push(sample.frequency(population)),
                    Some(Response::No) => non_responders.push(sample.frequency(population)),
                    None => {}
                }
            }

            let outcome = welch_t_test(&responders, &non_responders);
            debug!(
                "{}: {} responders vs {} non-responders -> {:?}",
                population,
                responders.len(),
                non_responders.len(),
                outcome
            );

            (
                population,
                PopulationComparison {
                    population,
                    responders: responders.len(),
                    non_responders: non_responders.len(),
                    outcome,
                },
            )
        })
        .collect();

    ResponseComparison { comparisons }
}
