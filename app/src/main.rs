// ==============================================================================
// main.rs - Cell Populations Command Line Entry Point
// ==============================================================================
// Description: Database setup, CSV ingestion and dashboard report export
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cell_populations::ingest::ingest_csv;
use cell_populations::storage::CellCountStore;
use cell_populations::{DashboardView, FilterSelection, ReportWriter, Snapshot};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty cell count database
    InitDb {
        #[arg(long, env = "CELL_COUNTS_DB")]
        db: PathBuf,
    },

    /// Load a cell count CSV export into a new database
    Ingest {
        /// Cell count CSV file
        #[arg(long)]
        csv: PathBuf,

        #[arg(long, env = "CELL_COUNTS_DB")]
        db: PathBuf,
    },

    /// Print the selectable filter values as JSON
    Filters {
        #[arg(long, env = "CELL_COUNTS_DB")]
        db: PathBuf,
    },

    /// Compute the dashboard view and write report files
    Report {
        #[arg(long, env = "CELL_COUNTS_DB")]
        db: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "report")]
        out: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,
    },
}

/// Omitted dimensions select every value present in the database
#[derive(Args, Debug)]
struct FilterArgs {
    #[arg(long = "condition")]
    conditions: Vec<String>,

    #[arg(long = "treatment")]
    treatments: Vec<String>,

    #[arg(long = "sample-type")]
    sample_types: Vec<String>,

    /// Days from treatment start, or "none" for samples without a time
    #[arg(long = "time", value_parser = parse_time)]
    times: Vec<Option<i64>>,
}

impl FilterArgs {
    fn into_selection(self, snapshot: &Snapshot) -> FilterSelection {
        let mut selection = FilterSelection::all(snapshot);
        if !self.conditions.is_empty() {
            selection.conditions = self.conditions.into_iter().collect();
        }
        if !self.treatments.is_empty() {
            selection.treatments = self.treatments.into_iter().collect();
        }
        if !self.sample_types.is_empty() {
            selection.sample_types = self.sample_types.into_iter().collect();
        }
        if !self.times.is_empty() {
            selection.times = self.times.into_iter().collect();
        }
        selection
    }
}

fn parse_time(value: &str) -> Result<Option<i64>, String> {
    if value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    value
        .parse::<i64>()
        .map(Some)
        .map_err(|_| format!("expected an integer or \"none\", got {:?}", value))
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cell_populations=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::InitDb { db } => {
            CellCountStore::create(&db)
                .with_context(|| format!("Failed to initialize database {:?}", db))?;
            info!("Initialized empty database {:?}", db);
        }
        Command::Ingest { csv, db } => {
            let summary = ingest_csv(&csv, &db)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Filters { db } => {
            let snapshot = Snapshot::load(&db)?;
            println!("{}", serde_json::to_string_pretty(&snapshot.filter_options())?);
        }
        Command::Report { db, out, filters } => {
            let snapshot = Snapshot::load(&db)?;
            let selection = filters.into_selection(&snapshot);
            let view = DashboardView::compute(&snapshot, &selection);

            if view.sample_count == 0 {
                warn!("No samples match the selected filters");
            }

            let written = ReportWriter::new(out).write(&view)?;
            let mut paths: Vec<_> = written.values().collect();
            paths.sort();
            for path in paths {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("7"), Ok(Some(7)));
        assert_eq!(parse_time("None"), Ok(None));
        assert!(parse_time("seven").is_err());
    }

    #[test]
    fn test_cli_parses_report_filters() {
        let cli = Cli::try_parse_from([
            "cell-populations",
            "report",
            "--db",
            "cells.db",
            "--condition",
            "melanoma",
            "--time",
            "0",
            "--time",
            "none",
        ])
        .unwrap();

        match cli.command {
            Command::Report { db, out, filters } => {
                assert_eq!(db, PathBuf::from("cells.db"));
                assert_eq!(out, PathBuf::from("report"));
                assert_eq!(filters.conditions, vec!["melanoma"]);
                assert!(filters.treatments.is_empty());
                assert_eq!(filters.times, vec![Some(0), None]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
