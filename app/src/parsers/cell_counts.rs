// ==============================================================================
// cell_counts.rs - Cell Count CSV Parser
// ==============================================================================
// Description: Parser for flat per-sample cell count exports
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Format: CSV file with header
// Example:
//   project,subject,condition,age,sex,treatment,response,sample,sample_type,
//   time_from_treatment_start,b_cell,cd8_t_cell,cd4_t_cell,nk_cell,monocyte
//   prj1,sbj000,melanoma,57,F,tr1,yes,s000,PBMC,0,36000,24000,42000,6000,12000
// ==============================================================================

use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use crate::models::{CellCounts, Project, Response, Sample, Subject};

/// One row of the flat export (sample + subject + project columns)
#[derive(Debug, Clone, Deserialize)]
struct CellCountRow {
    project: String,
    subject: String,
    condition: String,
    age: i64,
    sex: String,
    treatment: String,
    #[serde(default)]
    response: String,
    sample: String,
    sample_type: String,
    time_from_treatment_start: Option<i64>,
    b_cell: u32,
    cd8_t_cell: u32,
    cd4_t_cell: u32,
    nk_cell: u32,
    monocyte: u32,
}

/// De-duplicated entity tables, each in first-seen order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellCountTables {
    pub projects: Vec<Project>,
    pub subjects: Vec<Subject>,
    pub samples: Vec<Sample>,
}

/// Errors that can occur during cell count file parsing
#[derive(Error, Debug)]
pub enum CellCountParseError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid response value at line {line}: {value:?}")]
    InvalidResponse { line: usize, value: String },

    #[error("Conflicting rows for {kind} {id} (line {line})")]
    Conflict {
        kind: &'static str,
        id: String,
        line: usize,
    },

    #[error("File is empty or contains no valid records")]
    EmptyFile,
}

/// Cell count CSV parser
pub struct CellCountParser;

impl CellCountParser {
    /// Parse a cell count export from disk
    pub fn parse(path: impl AsRef<Path>) -> Result<CellCountTables, CellCountParseError> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::parse_reader(file)
    }

    /// Parse a cell count export from any reader.
    ///
    /// Repeated project, subject and sample ids collapse into one entity.
    /// A repeated subject or sample id whose attributes differ from the
    /// first occurrence is rejected with `Conflict`.
    pub fn parse_reader<R: Read>(reader: R) -> Result<CellCountTables, CellCountParseError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut tables = CellCountTables::default();
        let mut project_index: HashMap<String, usize> = HashMap::new();
        let mut subject_index: HashMap<String, usize> = HashMap::new();
        let mut sample_index: HashMap<String, usize> = HashMap::new();

        for (idx, result) in reader.deserialize().enumerate() {
            // Header occupies line 1
            let line = idx + 2;
            let row: CellCountRow = result?;

            let response = Response::parse_optional(&row.response).map_err(|_| {
                CellCountParseError::InvalidResponse {
                    line,
                    value: row.response.clone(),
                }
            })?;

            if !project_index.contains_key(&row.project) {
                project_index.insert(row.project.clone(), tables.projects.len());
                tables.projects.push(Project {
                    project_id: row.project.clone(),
                });
            }

            let subject = Subject {
                subject_id: row.subject.clone(),
                condition: row.condition,
                age: row.age,
                sex: row.sex,
                treatment: row.treatment,
                response,
                project_id: row.project,
            };
            Self::insert_unique(
                &mut tables.subjects,
                &mut subject_index,
                subject,
                |s| &s.subject_id,
                "subject",
                line,
            )?;

            let sample = Sample {
                sample_id: row.sample,
                sample_type: row.sample_type,
                time_from_treatment_start: row.time_from_treatment_start,
                counts: CellCounts {
                    b_cell: row.b_cell,
                    cd8_t_cell: row.cd8_t_cell,
                    cd4_t_cell: row.cd4_t_cell,
                    nk_cell: row.nk_cell,
                    monocyte: row.monocyte,
                },
                subject_id: row.subject,
            };
            Self::insert_unique(
                &mut tables.samples,
                &mut sample_index,
                sample,
                |s| &s.sample_id,
                "sample",
                line,
            )?;
        }

        if tables.samples.is_empty() {
            return Err(CellCountParseError::EmptyFile);
        }

        Ok(tables)
    }

    fn insert_unique<T: PartialEq>(
        items: &mut Vec<T>,
        index: &mut HashMap<String, usize>,
        item: T,
        key: impl Fn(&T) -> &String,
        kind: &'static str,
        line: usize,
    ) -> Result<(), CellCountParseError> {
        match index.get(key(&item)) {
            Some(&existing) if items[existing] == item => Ok(()),
            Some(_) => Err(CellCountParseError::Conflict {
                kind,
                id: key(&item).clone(),
                line,
            }),
            None => {
                index.insert(key(&item).clone(), items.len());
                items.push(item);
                Ok(())
            }
        }
    }
}
