// ==============================================================================
// ingest.rs - Cell Count CSV Ingestion
// ==============================================================================
// Description: Loads a cell count CSV export into a new SQLite database
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::parsers::{CellCountParser, CellCountTables};
use crate::storage::CellCountStore;

/// Outcome of one ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub source_file: PathBuf,
    pub source_sha256: String,
    pub database: PathBuf,
    pub projects: usize,
    pub subjects: usize,
    pub samples: usize,
    pub ingested_at: String,
}

/// Parse `csv_path` and write it to a new database at `db_path`.
///
/// The database must not exist yet. A failed insert removes the
/// partially written file.
pub fn ingest_csv<P: AsRef<Path>, Q: AsRef<Path>>(csv_path: P, db_path: Q) -> Result<IngestSummary> {
    let csv_path = csv_path.as_ref();
    let db_path = db_path.as_ref();

    info!("Ingesting cell counts from {:?}", csv_path);

    let tables = CellCountParser::parse(csv_path)
        .with_context(|| format!("Failed to parse cell count file {:?}", csv_path))?;
    let source_sha256 = compute_sha256(csv_path)?;

    let mut store = CellCountStore::create(db_path).context("Failed to create database")?;

    let ingested_at = chrono::Utc::now().to_rfc3339();
    if let Err(e) = write_tables(&mut store, &tables, csv_path, &source_sha256, &ingested_at) {
        drop(store);
        if let Err(remove_err) = std::fs::remove_file(db_path) {
            warn!("Failed to remove partial database {:?}: {}", db_path, remove_err);
        }
        return Err(e);
    }

    let summary = IngestSummary {
        source_file: csv_path.to_path_buf(),
        source_sha256,
        database: db_path.to_path_buf(),
        projects: tables.projects.len(),
        subjects: tables.subjects.len(),
        samples: tables.samples.len(),
        ingested_at,
    };

    info!(
        "Ingested {} projects, {} subjects, {} samples into {:?}",
        summary.projects, summary.subjects, summary.samples, db_path
    );

    Ok(summary)
}

fn write_tables(
    store: &mut CellCountStore,
    tables: &CellCountTables,
    csv_path: &Path,
    source_sha256: &str,
    ingested_at: &str,
) -> Result<()> {
    // Parents before children
    store
        .insert_projects(&tables.projects)
        .context("Failed to insert projects")?;
    store
        .insert_subjects(&tables.subjects)
        .context("Failed to insert subjects")?;
    store
        .insert_samples(&tables.samples)
        .context("Failed to insert samples")?;

    let metadata = [
        ("source_file", csv_path.display().to_string()),
        ("source_sha256", source_sha256.to_string()),
        ("ingested_at", ingested_at.to_string()),
        ("project_count", tables.projects.len().to_string()),
        ("subject_count", tables.subjects.len().to_string()),
        ("sample_count", tables.samples.len().to_string()),
    ];
    for (key, value) in &metadata {
        store
            .set_metadata(key, value)
            .with_context(|| format!("Failed to record metadata {}", key))?;
    }

    Ok(())
}

fn compute_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
