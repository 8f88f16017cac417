// ==============================================================================
// storage.rs - Cell Count Database Access
// ==============================================================================
// Description: SQLite store for projects, subjects and samples
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Schema:
//   projects(project_id PK)
//   subjects(subject_id PK, condition, age, sex, treatment, response, project FK)
//   samples(sample_id PK, sample_type, time_from_treatment_start,
//           b_cell, cd8_t_cell, cd4_t_cell, nk_cell, monocyte, subject FK)
//   metadata(key PK, value)
// ==============================================================================

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Statement, ToSql};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{CellCounts, Project, Response, Sample, SampleRecord, Subject};

const SCHEMA: &str = "
CREATE TABLE projects (
    project_id TEXT PRIMARY KEY
);

CREATE TABLE subjects (
    subject_id TEXT PRIMARY KEY,
    condition TEXT NOT NULL,
    age INTEGER NOT NULL,
    sex TEXT NOT NULL,
    treatment TEXT NOT NULL,
    response TEXT CHECK (response IN ('yes', 'no')),
    project TEXT NOT NULL REFERENCES projects(project_id)
);

CREATE TABLE samples (
    sample_id TEXT PRIMARY KEY,
    sample_type TEXT NOT NULL,
    time_from_treatment_start INTEGER,
    b_cell INTEGER NOT NULL CHECK (b_cell >= 0),
    cd8_t_cell INTEGER NOT NULL CHECK (cd8_t_cell >= 0),
    cd4_t_cell INTEGER NOT NULL CHECK (cd4_t_cell >= 0),
    nk_cell INTEGER NOT NULL CHECK (nk_cell >= 0),
    monocyte INTEGER NOT NULL CHECK (monocyte >= 0),
    subject TEXT NOT NULL REFERENCES subjects(subject_id)
);

CREATE TABLE metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

const JOINED_SAMPLES_QUERY: &str = "
SELECT s.sample_id, s.sample_type, s.time_from_treatment_start,
       s.b_cell, s.cd8_t_cell, s.cd4_t_cell, s.nk_cell, s.monocyte,
       sub.subject_id, sub.condition, sub.age, sub.sex, sub.treatment, sub.response,
       p.project_id
FROM samples s
JOIN subjects sub ON s.subject = sub.subject_id
JOIN projects p ON sub.project = p.project_id
ORDER BY s.rowid
";

/// Errors raised by the cell count store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[source] rusqlite::Error),

    #[error("A data integrity error occurred: {0}")]
    Integrity(String),

    #[error("Database {0} already exists")]
    DatabaseExists(PathBuf),

    #[error("Database {0} does not exist")]
    DatabaseMissing(PathBuf),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg) if e.code == ErrorCode::ConstraintViolation => {
                StorageError::Integrity(msg.clone().unwrap_or_else(|| e.to_string()))
            }
            _ => StorageError::Sqlite(err),
        }
    }
}

impl ToSql for Response {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Response {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(1) => Ok(Response::Yes),
            ValueRef::Integer(0) => Ok(Response::No),
            ValueRef::Integer(other) => Err(FromSqlError::OutOfRange(other)),
            ValueRef::Text(_) => value
                .as_str()?
                .parse::<Response>()
                .map_err(|e| FromSqlError::Other(Box::new(e))),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// Row counts of the three entity tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub projects: usize,
    pub subjects: usize,
    pub samples: usize,
}

/// Cell count database (projects, subjects, samples)
pub struct CellCountStore {
    conn: Connection,
}

impl CellCountStore {
    /// Create a new database file with the cell count schema.
    ///
    /// Fails with `DatabaseExists` rather than touching an existing file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if path.exists() {
            return Err(StorageError::DatabaseExists(path.to_path_buf()));
        }

        let conn = Connection::open(path)?;
        let store = Self::with_connection(conn)?;
        store.conn.execute_batch(SCHEMA)?;

        info!("Created cell count database: {:?}", path);
        Ok(store)
    }

    /// Open an existing cell count database
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StorageError::DatabaseMissing(path.to_path_buf()));
        }

        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// In-memory database with the schema applied
    pub fn in_memory() -> Result<Self, StorageError> {
        let store = Self::with_connection(Connection::open_in_memory()?)?;
        store.conn.execute_batch(SCHEMA)?;
        Ok(store)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    /// Check that the schema is present and report table sizes
    pub fn validate(&self) -> Result<StoreStats, StorageError> {
        let stats = StoreStats {
            projects: self.count_rows("projects")?,
            subjects: self.count_rows("subjects")?,
            samples: self.count_rows("samples")?,
        };

        info!(
            "Cell count database validated: {} projects, {} subjects, {} samples",
            stats.projects, stats.subjects, stats.samples
        );

        Ok(stats)
    }

    fn count_rows(&self, table: &str) -> Result<usize, StorageError> {
        let mut stmt = self.conn.prepare(&format!("SELECT COUNT(*) FROM {}", table))?;
        let count: usize = stmt.query_row([], |row| row.get(0))?;
        Ok(count)
    }

    pub fn insert_projects(&mut self, projects: &[Project]) -> Result<usize, StorageError> {
        self.insert_batch(
            "INSERT INTO projects (project_id) VALUES (?1)",
            projects,
            |stmt, project| stmt.execute(params![project.project_id]),
        )
    }

    pub fn insert_subjects(&mut self, subjects: &[Subject]) -> Result<usize, StorageError> {
        self.insert_batch(
            "INSERT INTO subjects (subject_id, condition, age, sex, treatment, response, project)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            subjects,
            |stmt, subject| {
                stmt.execute(params![
                    subject.subject_id,
                    subject.condition,
                    subject.age,
                    subject.sex,
                    subject.treatment,
                    subject.response,
                    subject.project_id,
                ])
            },
        )
    }

    pub fn insert_samples(&mut self, samples: &[Sample]) -> Result<usize, StorageError> {
        self.insert_batch(
            "INSERT INTO samples (sample_id, sample_type, time_from_treatment_start,
                                  b_cell, cd8_t_cell, cd4_t_cell, nk_cell, monocyte, subject)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            samples,
            |stmt, sample| {
                stmt.execute(params![
                    sample.sample_id,
                    sample.sample_type,
                    sample.time_from_treatment_start,
                    sample.counts.b_cell,
                    sample.counts.cd8_t_cell,
                    sample.counts.cd4_t_cell,
                    sample.counts.nk_cell,
                    sample.counts.monocyte,
                    sample.subject_id,
                ])
            },
        )
    }

    /// Insert every item in one transaction; any failure rolls the batch back
    fn insert_batch<T>(
        &mut self,
        sql: &str,
        items: &[T],
        mut bind: impl FnMut(&mut Statement<'_>, &T) -> rusqlite::Result<usize>,
    ) -> Result<usize, StorageError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(sql)?;
            for item in items {
                bind(&mut stmt, item)?;
            }
        }
        tx.commit()?;

        debug!("Inserted {} rows", items.len());
        Ok(items.len())
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM metadata WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get(0)).optional()?;
        Ok(result)
    }

    /// Read every sample joined to its subject and project, in insertion order
    pub fn load_records(&self) -> Result<Vec<SampleRecord>, StorageError> {
        let mut stmt = self.conn.prepare(JOINED_SAMPLES_QUERY)?;

        let record_iter = stmt.query_map([], |row| {
            Ok(SampleRecord {
                sample_id: row.get(0)?,
                sample_type: row.get(1)?,
                time_from_treatment_start: row.get(2)?,
                counts: CellCounts {
                    b_cell: row.get(3)?,
                    cd8_t_cell: row.get(4)?,
                    cd4_t_cell: row.get(5)?,
                    nk_cell: row.get(6)?,
                    monocyte: row.get(7)?,
                },
                subject_id: row.get(8)?,
                condition: row.get(9)?,
                age: row.get(10)?,
                sex: row.get(11)?,
                treatment: row.get(12)?,
                response: row.get(13)?,
                project_id: row.get(14)?,
            })
        })?;

        let mut records = Vec::new();
        for record in record_iter {
            records.push(record?);
        }

        info!("Loaded {} joined sample rows", records.len());
        Ok(records)
    }
}
