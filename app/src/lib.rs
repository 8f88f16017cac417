// ==============================================================================
// lib.rs - Cell Populations Library
// ==============================================================================
// Description: Library interface for immune cell population analytics
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

pub mod models;
pub mod storage;
pub mod parsers;
pub mod ingest;
pub mod metrics;
pub mod snapshot;
pub mod filter;
pub mod summary;
pub mod stats;
pub mod tally;
pub mod charts;
pub mod report;

#[cfg(test)]
pub(crate) mod test_support;

pub use filter::FilterSelection;
pub use report::{DashboardView, ReportWriter};
pub use snapshot::Snapshot;
