//! Check that jobs were allocated the resources their workload asked for.

use crate::error::PlotError;
use crate::records::read_records;
use anyhow::Result;
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Raw allocation text of a `jobs.csv` row, compared verbatim
#[derive(Debug, Deserialize)]
struct AllocationRow {
    job_id: String,
    #[serde(default)]
    allocated_resources: String,
}

#[derive(Debug, Deserialize)]
struct Workload {
    jobs: Vec<WorkloadJob>,
}

#[derive(Debug, Deserialize)]
struct WorkloadJob {
    id: Value,
    #[serde(default)]
    extra_data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ExtraData {
    desired_allocation: Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub job_id: String,
    pub expected: String,
    pub allocated: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verification {
    /// Jobs present in both files
    pub checked: usize,
    pub mismatches: Vec<Mismatch>,
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Numbers and strings compare through their textual form
fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

/// `extra_data` is either an object or a string holding one
fn desired_allocation(extra_data: &Value) -> Result<String, serde_json::Error> {
    let extra: ExtraData = match extra_data {
        Value::String(raw) => serde_json::from_str(raw)?,
        other => serde_json::from_value(other.clone())?,
    };
    Ok(as_text(&extra.desired_allocation))
}

/// Desired allocation of every workload job that declares one, by job id
fn load_desired_allocations(path: &Path) -> Result<HashMap<String, String>, PlotError> {
    let text = fs::read_to_string(path).map_err(|e| PlotError::file_format(path, e))?;
    let workload: Workload =
        serde_json::from_str(&text).map_err(|e| PlotError::file_format(path, e))?;

    let mut desired = HashMap::new();
    for job in &workload.jobs {
        let id = as_text(&job.id);
        let Some(extra_data) = &job.extra_data else {
            debug!("Workload job {} has no extra data", id);
            continue;
        };
        let allocation = desired_allocation(extra_data)
            .map_err(|e| PlotError::file_format(path, format!("job {}: {}", id, e)))?;
        desired.insert(id, allocation);
    }
    Ok(desired)
}

/// Compare the allocations of `jobs_csv` with those requested in `workload`.
///
/// Only jobs found in both files are compared.
pub fn verify_allocations(jobs_csv: &Path, workload: &Path) -> Result<Verification, PlotError> {
    let desired = load_desired_allocations(workload)?;
    let rows: Vec<AllocationRow> = read_records(jobs_csv, &["job_id", "allocated_resources"])?;

    let mut verification = Verification::default();
    for row in rows {
        let Some(expected) = desired.get(row.job_id.trim()) else {
            continue;
        };
        verification.checked += 1;
        let allocated = row.allocated_resources.trim();
        if allocated != expected {
            verification.mismatches.push(Mismatch {
                job_id: row.job_id,
                expected: expected.clone(),
                allocated: allocated.to_string(),
            });
        }
    }
    Ok(verification)
}

/// Run the `verify` command, failing if any allocation differs.
pub fn run(jobs_csv: &Path, workload: &Path) -> Result<()> {
    let verification = verify_allocations(jobs_csv, workload)?;
    info!("Checked {} job(s)", verification.checked);

    if verification.is_valid() {
        println!("All jobs are valid! ({} checked)", verification.checked);
        return Ok(());
    }

    println!("Some jobs have an unexpected allocation");
    println!("{:<12} {:<24} {:<24}", "job_id", "expected", "allocated");
    println!("{}", "-".repeat(60));
    for m in &verification.mismatches {
        println!("{:<12} {:<24} {:<24}", m.job_id, m.expected, m.allocated);
    }

    Err(PlotError::AllocationMismatch {
        count: verification.mismatches.len(),
    }
    .into())
}
