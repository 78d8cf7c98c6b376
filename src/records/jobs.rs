//! Job records from a batsim `jobs.csv`.

use super::intervals::IntervalSet;
use super::read_records;
use crate::error::PlotError;
use serde::Deserialize;
use std::path::Path;

const REQUIRED_COLUMNS: [&str; 4] = [
    "job_id",
    "submission_time",
    "waiting_time",
    "allocated_resources",
];

/// One scheduled or rejected job
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub submission_time: f64,
    #[serde(default)]
    pub waiting_time: Option<f64>,
    #[serde(default)]
    pub starting_time: Option<f64>,
    #[serde(default)]
    pub finish_time: Option<f64>,
    #[serde(default)]
    pub allocated_resources: IntervalSet,
}

impl JobRecord {
    /// Rejected jobs never receive resources
    pub fn is_rejected(&self) -> bool {
        self.allocated_resources.is_empty()
    }

    /// Time interval during which the job held its resources
    pub fn execution_span(&self) -> Option<(f64, f64)> {
        match (self.starting_time, self.finish_time) {
            (Some(start), Some(finish)) if finish >= start && !self.is_rejected() => {
                Some((start, finish))
            }
            _ => None,
        }
    }
}

/// Load every job of a file.
///
/// Jobs are not windowed here: a job submitted before the window may still
/// run inside it. Panels clip them instead.
pub fn load_jobs(path: &Path) -> Result<Vec<JobRecord>, PlotError> {
    read_records(path, &REQUIRED_COLUMNS)
}
