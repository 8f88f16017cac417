// ==============================================================================
// models.rs - Cell Population Data Models
// ==============================================================================
// Description: Typed records for projects, subjects, samples and populations
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Measured immune cell population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Population {
    #[serde(rename = "b_cell")]
    BCell,
    #[serde(rename = "cd8_t_cell")]
    Cd8TCell,
    #[serde(rename = "cd4_t_cell")]
    Cd4TCell,
    #[serde(rename = "nk_cell")]
    NkCell,
    #[serde(rename = "monocyte")]
    Monocyte,
}

impl Population {
    /// All populations in column order
    pub const ALL: [Population; 5] = [
        Population::BCell,
        Population::Cd8TCell,
        Population::Cd4TCell,
        Population::NkCell,
        Population::Monocyte,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Population::BCell => "b_cell",
            Population::Cd8TCell => "cd8_t_cell",
            Population::Cd4TCell => "cd4_t_cell",
            Population::NkCell => "nk_cell",
            Population::Monocyte => "monocyte",
        }
    }

    /// Name of the derived frequency column (e.g. "b_cell_frequency")
    pub fn frequency_column(&self) -> String {
        format!("{}_frequency", self.as_str())
    }

    /// Position within `Population::ALL`
    pub fn index(&self) -> usize {
        match self {
            Population::BCell => 0,
            Population::Cd8TCell => 1,
            Population::Cd4TCell => 2,
            Population::NkCell => 3,
            Population::Monocyte => 4,
        }
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Population {
    type Err = ParseModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Population::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| ParseModelError::UnknownPopulation(s.to_string()))
    }
}

/// Treatment response of a subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    Yes,
    No,
}

impl Response {
    pub fn as_str(&self) -> &'static str {
        match self {
            Response::Yes => "yes",
            Response::No => "no",
        }
    }

    pub fn is_responder(&self) -> bool {
        matches!(self, Response::Yes)
    }

    /// Parse a stored or exported response value.
    ///
    /// Accepts "yes"/"no", "true"/"false" and "1"/"0" (case-insensitive).
    /// An empty value means no response was recorded and yields `Ok(None)`.
    pub fn parse_optional(value: &str) -> Result<Option<Self>, ParseModelError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "yes" | "true" | "1" => Ok(Some(Response::Yes)),
            "no" | "false" | "0" => Ok(Some(Response::No)),
            _ => Err(ParseModelError::InvalidResponse(value.to_string())),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Response {
    type Err = ParseModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Response::parse_optional(s)?.ok_or_else(|| ParseModelError::InvalidResponse(s.to_string()))
    }
}

/// Errors raised when converting raw values into model types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseModelError {
    #[error("Invalid response value: {0:?} (expected yes/no)")]
    InvalidResponse(String),

    #[error("Unknown cell population: {0:?}")]
    UnknownPopulation(String),
}

/// Raw cell counts of the five populations for one sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellCounts {
    pub b_cell: u32,
    pub cd8_t_cell: u32,
    pub cd4_t_cell: u32,
    pub nk_cell: u32,
    pub monocyte: u32,
}

impl CellCounts {
    pub fn get(&self, population: Population) -> u32 {
        match population {
            Population::BCell => self.b_cell,
            Population::Cd8TCell => self.cd8_t_cell,
            Population::Cd4TCell => self.cd4_t_cell,
            Population::NkCell => self.nk_cell,
            Population::Monocyte => self.monocyte,
        }
    }

    /// Sum of the five counts
    pub fn total(&self) -> u64 {
        self.iter().map(|(_, count)| u64::from(count)).sum()
    }

    /// (population, count) pairs in `Population::ALL` order
    pub fn iter(&self) -> impl Iterator<Item = (Population, u32)> + '_ {
        Population::ALL.into_iter().map(move |p| (p, self.get(p)))
    }
}

/// Immune cell population project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,
}

/// Subject enrolled in a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub subject_id: String,
    pub condition: String,
    pub age: i64,
    pub sex: String,
    pub treatment: String,
    /// None when no response was recorded (e.g. untreated subjects)
    pub response: Option<Response>,
    pub project_id: String,
}

/// Individual sample taken from a subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub sample_id: String,
    pub sample_type: String,
    pub time_from_treatment_start: Option<i64>,
    pub counts: CellCounts,
    pub subject_id: String,
}

/// One denormalized row: sample joined to its subject and project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub sample_id: String,
    pub sample_type: String,
    pub time_from_treatment_start: Option<i64>,
    pub counts: CellCounts,
    pub subject_id: String,
    pub condition: String,
    pub age: i64,
    pub sex: String,
    pub treatment: String,
    pub response: Option<Response>,
    pub project_id: String,
}

impl SampleRecord {
    /// Join a sample with its subject (the subject carries the project id)
    pub fn join(sample: Sample, subject: &Subject) -> Self {
        Self {
            sample_id: sample.sample_id,
            sample_type: sample.sample_type,
            time_from_treatment_start: sample.time_from_treatment_start,
            counts: sample.counts,
            subject_id: sample.subject_id,
            condition: subject.condition.clone(),
            age: subject.age,
            sex: subject.sex.clone(),
            treatment: subject.treatment.clone(),
            response: subject.response,
            project_id: subject.project_id.clone(),
        }
    }
}
