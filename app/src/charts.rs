// ==============================================================================
// charts.rs - Dashboard Chart Adapters
// ==============================================================================
// Description: Pie charts and annotated boxplots built from core outputs
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;
use serde::Serialize;
use statrs::statistics::{Data, Distribution, Max, Min};
use thiserror::Error;

use crate::metrics::{format_decimal, round_half_even};
use crate::models::{Population, Response};
use crate::stats::{FrequencyRecord, ResponseComparison, TestOutcome};
use crate::tally::CategoryCount;

pub const BOXPLOT_TITLE: &str =
    "Comparing Cell Population Frequencies of Responders vs Non-Responders";
pub const PROJECT_PIE_TITLE: &str = "Samples Per Project";
pub const RESPONSE_PIE_TITLE: &str = "Responders vs Non-Responders";
pub const SEX_PIE_TITLE: &str = "Male vs Female";

const BOXPLOT_SIZE: (u32, u32) = (1400, 500);
const PIE_SIZE: (u32, u32) = (400, 300);

/// Box groups in display order
const RESPONSE_GROUPS: [Response; 2] = [Response::Yes, Response::No];
static GROUP_LABELS: [&str; 2] = ["yes", "no"];

const SLICE_COLORS: [RGBColor; 6] = [
    RGBColor(99, 110, 250),
    RGBColor(239, 85, 59),
    RGBColor(0, 204, 150),
    RGBColor(171, 99, 250),
    RGBColor(255, 161, 90),
    RGBColor(25, 211, 243),
];

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Chart rendering failed: {0}")]
    Render(String),
}

fn render_error<E: std::fmt::Display>(err: E) -> ChartError {
    ChartError::Render(err.to_string())
}

/// Pie chart of a categorical tally
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub title: String,
    pub slices: Vec<CategoryCount>,
}

impl PieChart {
    pub fn new(title: &str, slices: Vec<CategoryCount>) -> Self {
        Self {
            title: title.to_string(),
            slices,
        }
    }

    pub fn total(&self) -> usize {
        self.slices.iter().map(|s| s.count).sum()
    }
}

/// Box summary of one group.
///
/// Quartiles and whisker fences are the ones plotters draws
/// (linear interpolation, fences at 1.5 IQR).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxStats {
    pub count: usize,
    pub min: f64,
    pub lower_fence: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_fence: f64,
    pub max: f64,
    pub mean: f64,
}

impl BoxStats {
    /// Returns None for an empty group
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let [lower_fence, q1, median, q3, upper_fence] = box_quartiles(values)?.values();
        let data = Data::new(values.to_vec());

        Some(Self {
            count: values.len(),
            min: data.min(),
            lower_fence: f64::from(lower_fence),
            q1: f64::from(q1),
            median: f64::from(median),
            q3: f64::from(q3),
            upper_fence: f64::from(upper_fence),
            max: data.max(),
            mean: data.mean()?,
        })
    }
}

/// Quartiles shared by `BoxStats` and the drawn boxes
fn box_quartiles(values: &[f64]) -> Option<Quartiles> {
    if values.is_empty() {
        None
    } else {
        Some(Quartiles::new(values))
    }
}

/// Frequencies of one response group within a facet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxGroup {
    pub response: Response,
    pub values: Vec<f64>,
    pub stats: Option<BoxStats>,
}

/// One population panel of the boxplot figure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxplotFacet {
    pub population: Population,
    pub groups: Vec<BoxGroup>,
    /// e.g. "p = 0.0299", or "p = n/a" when no test was possible
    pub annotation: String,
    /// Horizontal centre of the facet as a fraction of the figure width
    pub annotation_x: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxplotFigure {
    pub title: String,
    pub facets: Vec<BoxplotFacet>,
}

/// Annotation text for a comparison outcome (p rounded to 4 decimals)
pub fn p_value_annotation(outcome: &TestOutcome) -> String {
    match outcome.p_value() {
        Some(p) => format!("p = {}", format_decimal(round_half_even(p, 4))),
        None => "p = n/a".to_string(),
    }
}

/// Facets ordered by population name, each annotated with its p-value
pub fn boxplot_figure(records: &[FrequencyRecord], comparison: &ResponseComparison) -> BoxplotFigure {
    let mut populations = Population::ALL.to_vec();
    populations.sort_by_key(|p| p.as_str());
    let num_facets = populations.len() as f64;

    let facets = populations
        .into_iter()
        .enumerate()
        .map(|(i, population)| {
            let groups = RESPONSE_GROUPS
                .iter()
                .map(|&response| {
                    let values: Vec<f64> = records
                        .iter()
                        .filter(|r| r.population == population && r.response == response)
                        .map(|r| r.frequency)
                        .collect();
                    BoxGroup {
                        response,
                        stats: BoxStats::from_values(&values),
                        values,
                    }
                })
                .collect();

            let annotation = comparison
                .get(population)
                .map(|c| p_value_annotation(&c.outcome))
                .unwrap_or_else(|| p_value_annotation(&TestOutcome::InsufficientData));

            BoxplotFacet {
                population,
                groups,
                annotation,
                annotation_x: (i as f64 + 0.5) / num_facets,
            }
        })
        .collect();

    BoxplotFigure {
        title: BOXPLOT_TITLE.to_string(),
        facets,
    }
}

/// Render the boxplot figure as an SVG document
pub fn render_boxplots_svg(figure: &BoxplotFigure) -> Result<String, ChartError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, BOXPLOT_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;
        let area = root
            .titled(&figure.title, ("sans-serif", 20))
            .map_err(render_error)?;

        let panels = area.split_evenly((1, figure.facets.len().max(1)));
        for (panel, facet) in panels.iter().zip(&figure.facets) {
            draw_facet(panel, facet)?;
        }

        root.present().map_err(render_error)?;
    }
    Ok(svg)
}

fn draw_facet(area: &DrawingArea<SVGBackend<'_>, Shift>, facet: &BoxplotFacet) -> Result<(), ChartError> {
    let mut chart = ChartBuilder::on(area)
        .caption(facet.population.frequency_column(), ("sans-serif", 14))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(GROUP_LABELS[..].into_segmented(), 0f32..1f32)
        .map_err(render_error)?;

    chart
        .configure_mesh()
        .x_desc(facet.annotation.as_str())
        .y_desc("frequency")
        .draw()
        .map_err(render_error)?;

    let boxes: Vec<_> = facet
        .groups
        .iter()
        .zip(GROUP_LABELS.iter())
        .filter_map(|(group, label)| {
            box_quartiles(&group.values)
                .map(|quartiles| Boxplot::new_vertical(SegmentValue::CenterOf(label), &quartiles))
        })
        .collect();

    chart.draw_series(boxes).map_err(render_error)?;
    Ok(())
}

/// Render a pie chart as an SVG document; an empty tally draws only the title
pub fn render_pie_svg(chart: &PieChart) -> Result<String, ChartError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, PIE_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;
        let area = root
            .titled(&chart.title, ("sans-serif", 16))
            .map_err(render_error)?;

        if chart.total() > 0 {
            let (width, height) = area.dim_in_pixel();
            let center = (width as i32 / 2, height as i32 / 2);
            let radius = f64::from(width.min(height)) * 0.35;
            let sizes: Vec<f64> = chart.slices.iter().map(|s| s.count as f64).collect();
            let colors: Vec<RGBColor> = (0..sizes.len())
                .map(|i| SLICE_COLORS[i % SLICE_COLORS.len()])
                .collect();
            let labels: Vec<String> = chart
                .slices
                .iter()
                .map(|s| format!("{} ({})", s.label, s.count))
                .collect();

            let pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
            area.draw(&pie).map_err(render_error)?;
        }

        root.present().map_err(render_error)?;
    }
    Ok(svg)
}
