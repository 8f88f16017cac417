// ==============================================================================
// snapshot.rs - Immutable Derived Sample Snapshot
// ==============================================================================
// Description: Read-only table of derived samples shared across recomputations
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::hash::Hash;
use std::path::Path;
use tracing::info;

use crate::metrics::{build_snapshot, DerivedSample};
use crate::storage::CellCountStore;

/// Immutable set of derived samples.
///
/// Only the metrics builder constructs one, so every sample in a snapshot
/// has a non-zero total and well-defined frequencies.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    samples: Vec<DerivedSample>,
}

/// Distinct values available to each filter dimension
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub conditions: Vec<String>,
    pub treatments: Vec<String>,
    pub sample_types: Vec<String>,
    pub times: Vec<Option<i64>>,
}

impl Snapshot {
    pub(crate) fn from_derived(samples: Vec<DerivedSample>) -> Self {
        Self { samples }
    }

    /// Load every sample from the database and derive its metrics
    pub fn load<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        info!("Loading cell count snapshot from {:?}", db_path);

        let store = CellCountStore::open(db_path).context("Failed to open cell count database")?;
        store.validate().context("Cell count database validation failed")?;

        let records = store.load_records().context("Failed to read samples")?;
        let snapshot = build_snapshot(records).context("Failed to derive sample metrics")?;

        info!("Snapshot ready: {} samples", snapshot.len());
        Ok(snapshot)
    }

    pub fn samples(&self) -> &[DerivedSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, sample_id: &str) -> Option<&DerivedSample> {
        self.samples.iter().find(|s| s.sample_id() == sample_id)
    }

    /// Distinct values per filter dimension, in first-seen order
    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            conditions: distinct(self.samples.iter().map(|s| s.record.condition.clone())),
            treatments: distinct(self.samples.iter().map(|s| s.record.treatment.clone())),
            sample_types: distinct(self.samples.iter().map(|s| s.record.sample_type.clone())),
            times: distinct(self.samples.iter().map(|s| s.record.time_from_treatment_start)),
        }
    }
}

fn distinct<T: Clone + Eq + Hash>(values: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    values.filter(|v| seen.insert(v.clone())).collect()
}
