// ==============================================================================
// test_support.rs - Synthetic Snapshot Fixtures
// ==============================================================================
// Description: Helpers for building in-memory snapshots in unit tests
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use crate::metrics::build_snapshot;
use crate::models::{CellCounts, Response, SampleRecord};
use crate::snapshot::Snapshot;

/// Sample record with sensible defaults, adjusted through the builder methods
pub struct RecordBuilder {
    record: SampleRecord,
}

impl RecordBuilder {
    pub fn new(sample_id: &str) -> Self {
        Self {
            record: SampleRecord {
                sample_id: sample_id.to_string(),
                sample_type: "PBMC".to_string(),
                time_from_treatment_start: Some(0),
                counts: CellCounts {
                    b_cell: 100,
                    cd8_t_cell: 200,
                    cd4_t_cell: 300,
                    nk_cell: 150,
                    monocyte: 250,
                },
                subject_id: format!("sbj-{sample_id}"),
                condition: "melanoma".to_string(),
                age: 60,
                sex: "F".to_string(),
                treatment: "tr1".to_string(),
                response: Some(Response::Yes),
                project_id: "prj1".to_string(),
            },
        }
    }

    pub fn response(mut self, response: Option<Response>) -> Self {
        self.record.response = response;
        self
    }

    pub fn condition(mut self, condition: &str) -> Self {
        self.record.condition = condition.to_string();
        self
    }

    pub fn treatment(mut self, treatment: &str) -> Self {
        self.record.treatment = treatment.to_string();
        self
    }

    pub fn sample_type(mut self, sample_type: &str) -> Self {
        self.record.sample_type = sample_type.to_string();
        self
    }

    pub fn time(mut self, time: Option<i64>) -> Self {
        self.record.time_from_treatment_start = time;
        self
    }

    pub fn project(mut self, project_id: &str) -> Self {
        self.record.project_id = project_id.to_string();
        self
    }

    pub fn sex(mut self, sex: &str) -> Self {
        self.record.sex = sex.to_string();
        self
    }

    pub fn counts(mut self, values: [u32; 5]) -> Self {
        self.record.counts = CellCounts {
            b_cell: values[0],
            cd8_t_cell: values[1],
            cd4_t_cell: values[2],
            nk_cell: values[3],
            monocyte: values[4],
        };
        self
    }

    /// Counts chosen so that the b_cell frequency is exactly `permille / 1000`
    pub fn b_cell_permille(self, permille: u32) -> Self {
        let rest = 1000 - permille;
        self.counts([permille, rest / 4, rest / 4, rest / 4, rest - 3 * (rest / 4)])
    }

    pub fn build(self) -> SampleRecord {
        self.record
    }
}

pub fn snapshot(builders: Vec<RecordBuilder>) -> Snapshot {
    build_snapshot(builders.into_iter().map(RecordBuilder::build).collect())
        .expect("fixture records are well formed")
}

/// Eight samples across two conditions, two treatments, two sample types,
/// three time points and both response groups.
pub fn mixed_snapshot() -> Snapshot {
    snapshot(vec![
        RecordBuilder::new("s1").b_cell_permille(500).time(Some(0)),
        RecordBuilder::new("s2").b_cell_permille(600).time(Some(7)).sex("M"),
        RecordBuilder::new("s3")
            .b_cell_permille(100)
            .response(Some(Response::No))
            .time(Some(14)),
        RecordBuilder::new("s4")
            .b_cell_permille(200)
            .response(Some(Response::No))
            .project("prj2"),
        RecordBuilder::new("s5")
            .condition("carcinoma")
            .treatment("tr2")
            .b_cell_permille(300)
            .sex("M"),
        RecordBuilder::new("s6")
            .condition("healthy")
            .treatment("none")
            .response(None)
            .time(None)
            .project("prj3"),
        RecordBuilder::new("s7")
            .sample_type("tumor")
            .response(Some(Response::No))
            .b_cell_permille(250),
        RecordBuilder::new("s8")
            .condition("carcinoma")
            .treatment("tr2")
            .sample_type("tumor")
            .response(Some(Response::No))
            .time(Some(7))
            .project("prj2"),
    ])
}
