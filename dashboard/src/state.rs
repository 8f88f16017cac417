// ==============================================================================
// state.rs - Application State Management
// ==============================================================================
// Description: Shared read-only snapshot for the dashboard service
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use cell_populations::Snapshot;

const DEFAULT_DB_PATH: &str = "cell-count.db";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Derived samples, loaded once at startup
    snapshot: Snapshot,

    /// Database the snapshot was read from
    db_path: PathBuf,

    loaded_at: DateTime<Utc>,
}

impl AppState {
    /// Load the snapshot from the database named by `CELL_COUNTS_DB`
    pub async fn from_env() -> Result<Self> {
        let db_path = PathBuf::from(
            std::env::var("CELL_COUNTS_DB").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string()),
        );

        let load_path = db_path.clone();
        let snapshot = tokio::task::spawn_blocking(move || Snapshot::load(&load_path))
            .await
            .context("Snapshot loading task panicked")??;

        info!("Loaded {} samples from {:?}", snapshot.len(), db_path);

        Ok(Self::from_snapshot(snapshot, db_path))
    }

    pub fn from_snapshot(snapshot: Snapshot, db_path: PathBuf) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                snapshot,
                db_path,
                loaded_at: Utc::now(),
            }),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.inner.snapshot
    }

    pub fn db_path(&self) -> &Path {
        &self.inner.db_path
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.inner.loaded_at
    }
}
