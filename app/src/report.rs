// ==============================================================================
// report.rs - Dashboard View Recompute and Report Writer
// ==============================================================================
// Description: One filter-to-charts pass over the snapshot, plus file export
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Recompute pipeline (pure, no I/O):
//   Filter -> Summary -> Stats -> Tallies -> Charts
// ==============================================================================

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::charts::{
    boxplot_figure, render_boxplots_svg, render_pie_svg, BoxplotFigure, PieChart,
    PROJECT_PIE_TITLE, RESPONSE_PIE_TITLE, SEX_PIE_TITLE,
};
use crate::filter::{apply, FilterSelection};
use crate::snapshot::Snapshot;
use crate::stats::{compare_responders, frequency_records, FrequencyRecord, ResponseComparison};
use crate::summary::{summarize, SummaryRow};
use crate::tally::{project_counts, response_counts, sex_counts};

/// Everything the dashboard shows for one filter selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub selection: FilterSelection,
    pub sample_count: usize,
    pub summary: Vec<SummaryRow>,
    pub statistics: ResponseComparison,
    pub frequencies: Vec<FrequencyRecord>,
    pub project_chart: PieChart,
    pub response_chart: PieChart,
    pub sex_chart: PieChart,
    pub boxplots: BoxplotFigure,
}

impl DashboardView {
    /// Recompute every dashboard output from the snapshot.
    ///
    /// Deterministic for a given snapshot and selection; never fails,
    /// an empty filter result yields empty tables and untested comparisons.
    pub fn compute(snapshot: &Snapshot, selection: &FilterSelection) -> Self {
        let filtered = apply(snapshot, selection);

        let summary = summarize(&filtered);
        let frequencies = frequency_records(&filtered);
        let statistics = compare_responders(&filtered);
        let boxplots = boxplot_figure(&frequencies, &statistics);

        debug!(
            "Recomputed dashboard: {} samples, {} summary rows",
            filtered.len(),
            summary.len()
        );

        Self {
            selection: selection.clone(),
            sample_count: filtered.len(),
            summary,
            statistics,
            frequencies,
            project_chart: PieChart::new(PROJECT_PIE_TITLE, project_counts(&filtered)),
            response_chart: PieChart::new(RESPONSE_PIE_TITLE, response_counts(&filtered)),
            sex_chart: PieChart::new(SEX_PIE_TITLE, sex_counts(&filtered)),
            boxplots,
        }
    }
}

/// Files produced by `ReportWriter`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportArtifact {
    SummaryCsv,
    StatisticsJson,
    DashboardJson,
    BoxplotSvg,
    ProjectPieSvg,
    ResponsePieSvg,
    SexPieSvg,
}

impl ReportArtifact {
    pub fn file_name(&self) -> &'static str {
        match self {
            ReportArtifact::SummaryCsv => "summary.csv",
            ReportArtifact::StatisticsJson => "statistics.json",
            ReportArtifact::DashboardJson => "dashboard.json",
            ReportArtifact::BoxplotSvg => "boxplots.svg",
            ReportArtifact::ProjectPieSvg => "projects.svg",
            ReportArtifact::ResponsePieSvg => "responses.svg",
            ReportArtifact::SexPieSvg => "sex.svg",
        }
    }

    /// MIME type for HTTP downloads
    pub fn mime_type(&self) -> &'static str {
        match self {
            ReportArtifact::SummaryCsv => "text/csv",
            ReportArtifact::StatisticsJson | ReportArtifact::DashboardJson => "application/json",
            ReportArtifact::BoxplotSvg
            | ReportArtifact::ProjectPieSvg
            | ReportArtifact::ResponsePieSvg
            | ReportArtifact::SexPieSvg => "image/svg+xml",
        }
    }
}

/// Writes a dashboard view to an output directory
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write all report artifacts.
    ///
    /// # Returns
    /// * HashMap of artifact -> file path. Charts that fail to render are
    ///   logged and left out.
    pub fn write(&self, view: &DashboardView) -> Result<HashMap<ReportArtifact, PathBuf>> {
        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory {:?}", self.output_dir)
        })?;

        let mut written = HashMap::new();

        let path = self.path_for(ReportArtifact::SummaryCsv);
        self.write_summary_csv(&path, &view.summary)?;
        written.insert(ReportArtifact::SummaryCsv, path);

        let path = self.path_for(ReportArtifact::StatisticsJson);
        self.write_json(&path, &view.statistics)?;
        written.insert(ReportArtifact::StatisticsJson, path);

        let path = self.path_for(ReportArtifact::DashboardJson);
        self.write_json(&path, view)?;
        written.insert(ReportArtifact::DashboardJson, path);

        let charts = [
            (ReportArtifact::BoxplotSvg, render_boxplots_svg(&view.boxplots)),
            (ReportArtifact::ProjectPieSvg, render_pie_svg(&view.project_chart)),
            (ReportArtifact::ResponsePieSvg, render_pie_svg(&view.response_chart)),
            (ReportArtifact::SexPieSvg, render_pie_svg(&view.sex_chart)),
        ];

        for (artifact, rendered) in charts {
            match rendered {
                Ok(svg) => {
                    let path = self.path_for(artifact);
                    std::fs::write(&path, svg)
                        .with_context(|| format!("Failed to write chart {:?}", path))?;
                    written.insert(artifact, path);
                }
                Err(e) => warn!("Skipping {}: {}", artifact.file_name(), e),
            }
        }

        info!(
            "Wrote {} report files to {:?}",
            written.len(),
            self.output_dir
        );

        Ok(written)
    }

    fn path_for(&self, artifact: ReportArtifact) -> PathBuf {
        self.output_dir.join(artifact.file_name())
    }

    fn write_summary_csv(&self, path: &Path, rows: &[SummaryRow]) -> Result<()> {
        let mut writer = csv::Writer::from_path(path).context("Failed to create summary CSV")?;

        // Header row even when the table is empty
        if rows.is_empty() {
            writer.write_record(["Sample", "Total", "Population", "PopulationCounts", "Frequency"])?;
        }
        for row in rows {
            writer.serialize(row).context("Failed to write summary row")?;
        }

        writer.flush().context("Failed to flush summary CSV")?;
        Ok(())
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create JSON file {:?}", path))?;

        serde_json::to_writer_pretty(file, value)
            .with_context(|| format!("Failed to write JSON file {:?}", path))?;

        Ok(())
    }
}
