//! Loading of batsim output files into per-instance record sets.

pub mod energy;
pub mod intervals;
pub mod jobs;
pub mod llh;
pub mod pstates;

pub use energy::{EnergySample, PowerSample};
pub use jobs::JobRecord;
pub use llh::{LlhMetric, LlhSample};
pub use pstates::{PowerStateRoles, PstateChange, PstateRole};

use crate::error::PlotError;
use crate::layout::{Feature, PanelPlan, PlotConfig};
use csv::{ReaderBuilder, Trim};
use log::debug;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Inclusive time window; a missing bound does not filter
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeWindow {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl TimeWindow {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, time: f64) -> bool {
        self.min.map_or(true, |min| time >= min) && self.max.map_or(true, |max| time <= max)
    }

    /// Restrict `[start, end]` to the window, `None` if nothing is left
    pub fn clip(&self, start: f64, end: f64) -> Option<(f64, f64)> {
        let start = self.min.map_or(start, |min| start.max(min));
        let end = self.max.map_or(end, |max| end.min(max));
        (start < end).then_some((start, end))
    }
}

/// Deserialize every row of a CSV file after checking its header.
pub(crate) fn read_records<T: DeserializeOwned>(
    path: &Path,
    required: &[&str],
) -> Result<Vec<T>, PlotError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| PlotError::file_format(path, e))?;

    let headers = reader
        .headers()
        .map_err(|e| PlotError::file_format(path, e))?
        .clone();
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(PlotError::file_format(
                path,
                format!("missing column '{}'", column),
            ));
        }
    }

    let mut records = Vec::new();
    for (row, result) in reader.deserialize::<T>().enumerate() {
        // Row numbers are 1-based and count the header line
        let record = result
            .map_err(|e| PlotError::file_format(path, format!("line {}: {}", row + 2, e)))?;
        records.push(record);
    }

    debug!("Read {} row(s) from {}", records.len(), path.display());
    Ok(records)
}

/// Everything loaded for one instance
#[derive(Debug, Clone, Default)]
pub struct InstanceData {
    pub name: String,
    pub jobs: Option<Vec<JobRecord>>,
    pub pstates: Option<Vec<PstateChange>>,
    pub energy: Option<Vec<EnergySample>>,
    pub power: Option<Vec<PowerSample>>,
    pub llh: Option<Vec<LlhSample>>,
}

/// Load the sources of every planned instance.
///
/// Only the sources some requested panel (or the summary) reads are opened.
pub fn load_instances(plan: &PanelPlan, config: &PlotConfig) -> Result<Vec<InstanceData>, PlotError> {
    let features = &config.features;
    let window = config.window;

    let want_jobs = features.gantt || features.llh || config.summary;
    let want_pstates = features.gantt;
    let metrics: Vec<LlhMetric> = features
        .requested()
        .iter()
        .filter_map(Feature::llh_metric)
        .collect();
    let want_llh = !metrics.is_empty() || config.summary;

    plan.instances
        .iter()
        .map(|instance| {
            debug!("Loading instance '{}'", instance.name);

            let jobs = instance
                .jobs
                .as_deref()
                .filter(|_| want_jobs)
                .map(jobs::load_jobs)
                .transpose()?;
            let pstates = instance
                .pstates
                .as_deref()
                .filter(|_| want_pstates)
                .map(pstates::load_pstates)
                .transpose()?;
            let energy = instance
                .energy
                .as_deref()
                .map(|path| energy::load_energy(path, window))
                .transpose()?;
            let power = energy.as_deref().map(energy::power_series);
            let llh = instance
                .llh
                .as_deref()
                .filter(|_| want_llh)
                .map(|path| llh::load_llh(path, window, &metrics))
                .transpose()?;

            Ok(InstanceData {
                name: instance.name.clone(),
                jobs,
                pstates,
                energy,
                power,
                llh,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{plan, Features, Plan, SourceLists};
    use std::fs;

    #[test]
    fn window_is_inclusive_on_both_ends() {
        let window = TimeWindow::new(Some(10.0), Some(20.0));
        assert!(window.contains(10.0));
        assert!(window.contains(20.0));
        assert!(!window.contains(9.999));
        assert!(!window.contains(20.001));
        assert!(TimeWindow::default().contains(-1e9));
    }

    #[test]
    fn clip_restricts_intervals() {
        let window = TimeWindow::new(Some(10.0), Some(20.0));
        assert_eq!(window.clip(0.0, 15.0), Some((10.0, 15.0)));
        assert_eq!(window.clip(12.0, 30.0), Some((12.0, 20.0)));
        assert_eq!(window.clip(0.0, 10.0), None);
        assert_eq!(TimeWindow::default().clip(1.0, 2.0), Some((1.0, 2.0)));
    }

    #[test]
    fn loads_only_what_panels_need() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = dir.path().join("jobs.csv");
        let energy = dir.path().join("energy.csv");
        fs::write(
            &jobs,
            "job_id,submission_time,waiting_time,starting_time,finish_time,allocated_resources\n1,0,0,0,5,0\n",
        )
        .unwrap();
        fs::write(&energy, "time,energy\n0,0\n1,10\n1,10\n2,25\n").unwrap();

        let config = PlotConfig {
            features: Features {
                power: true,
                ..Features::default()
            },
            sources: SourceLists {
                jobs: vec![jobs],
                energy: vec![energy],
                ..SourceLists::default()
            },
            ..PlotConfig::default()
        };
        let Plan::Draw(panel_plan) = plan(&config).unwrap() else {
            panic!("expected panels to draw");
        };

        let data = load_instances(&panel_plan, &config).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].name, "Unnamed");
        assert!(data[0].jobs.is_none());
        assert_eq!(data[0].energy.as_ref().map(Vec::len), Some(4));
        let power: Vec<f64> = data[0].power.iter().flatten().map(|p| p.power).collect();
        assert_eq!(power, vec![10.0, 15.0]);
    }
}
