//! Queue-health samples (liquid load horizon and friends).

use super::{read_records, TimeWindow};
use crate::error::PlotError;
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// One row of an LLH trace. Metric columns are optional; a column is only
/// required when a panel drawing it is requested.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LlhSample {
    pub date: f64,
    #[serde(default)]
    pub liquid_load_horizon: Option<f64>,
    #[serde(default)]
    pub load_in_queue: Option<f64>,
    #[serde(default)]
    pub nb_jobs_in_queue: Option<f64>,
    #[serde(default)]
    pub first_job_size: Option<f64>,
    #[serde(default)]
    pub priority_job_expected_waiting_time: Option<f64>,
    #[serde(default, deserialize_with = "flag_or_number")]
    pub priority_job_starting_expected_soon: Option<f64>,
}

/// Metric columns of an LLH trace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlhMetric {
    LiquidLoadHorizon,
    LoadInQueue,
    NbJobsInQueue,
    FirstJobSize,
    PriorityJobExpectedWaitingTime,
    PriorityJobStartingExpectedSoon,
}

impl LlhMetric {
    pub fn column(&self) -> &'static str {
        match self {
            LlhMetric::LiquidLoadHorizon => "liquid_load_horizon",
            LlhMetric::LoadInQueue => "load_in_queue",
            LlhMetric::NbJobsInQueue => "nb_jobs_in_queue",
            LlhMetric::FirstJobSize => "first_job_size",
            LlhMetric::PriorityJobExpectedWaitingTime => "priority_job_expected_waiting_time",
            LlhMetric::PriorityJobStartingExpectedSoon => "priority_job_starting_expected_soon",
        }
    }

    pub fn value(&self, sample: &LlhSample) -> Option<f64> {
        match self {
            LlhMetric::LiquidLoadHorizon => sample.liquid_load_horizon,
            LlhMetric::LoadInQueue => sample.load_in_queue,
            LlhMetric::NbJobsInQueue => sample.nb_jobs_in_queue,
            LlhMetric::FirstJobSize => sample.first_job_size,
            LlhMetric::PriorityJobExpectedWaitingTime => sample.priority_job_expected_waiting_time,
            LlhMetric::PriorityJobStartingExpectedSoon => sample.priority_job_starting_expected_soon,
        }
    }
}

/// Load an LLH trace, keeping rows dated inside `window`.
///
/// Fails if the `date` column or one of the `metrics` columns is absent.
pub fn load_llh(
    path: &Path,
    window: TimeWindow,
    metrics: &[LlhMetric],
) -> Result<Vec<LlhSample>, PlotError> {
    let mut required = vec!["date"];
    required.extend(metrics.iter().map(LlhMetric::column));

    let samples: Vec<LlhSample> = read_records(path, &required)?;
    Ok(samples
        .into_iter()
        .filter(|s| window.contains(s.date))
        .collect())
}

/// Accept `True`/`False` as written by pandas as well as plain numbers
fn flag_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        Ok(None)
    } else if raw.eq_ignore_ascii_case("true") {
        Ok(Some(1.0))
    } else if raw.eq_ignore_ascii_case("false") {
        Ok(Some(0.0))
    } else {
        raw.parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid flag '{}'", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const LLH_CSV: &str = "\
date,liquid_load_horizon,load_in_queue,nb_jobs_in_queue,first_job_size,priority_job_expected_waiting_time,priority_job_starting_expected_soon
0,0,0,0,,,False
60,120.5,640,3,16,30,True
120,80,320,2,8,0,1
";

    fn llh_file(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn reads_metrics_and_boolean_flags() {
        let f = llh_file(LLH_CSV);
        let samples = load_llh(
            f.path(),
            TimeWindow::default(),
            &[LlhMetric::LiquidLoadHorizon, LlhMetric::PriorityJobStartingExpectedSoon],
        )
        .unwrap();

        assert_eq!(samples.len(), 3);
        assert_eq!(samples[1].liquid_load_horizon, Some(120.5));
        assert_eq!(samples[0].first_job_size, None);

        let soon: Vec<Option<f64>> = samples
            .iter()
            .map(|s| LlhMetric::PriorityJobStartingExpectedSoon.value(s))
            .collect();
        assert_eq!(soon, vec![Some(0.0), Some(1.0), Some(1.0)]);
    }

    #[test]
    fn requested_metric_column_must_exist() {
        let f = llh_file("date,liquid_load_horizon\n0,1\n");
        assert!(load_llh(f.path(), TimeWindow::default(), &[LlhMetric::LiquidLoadHorizon]).is_ok());

        let err = load_llh(f.path(), TimeWindow::default(), &[LlhMetric::LoadInQueue]).unwrap_err();
        assert!(err.to_string().contains("load_in_queue"));
    }

    #[test]
    fn date_column_is_always_required() {
        let f = llh_file("time,liquid_load_horizon\n0,1\n");
        let err = load_llh(f.path(), TimeWindow::default(), &[]).unwrap_err();
        assert!(matches!(err, PlotError::FileFormat { .. }));
        assert!(err.to_string().contains("'date'"));
    }

    #[test]
    fn window_filters_on_date() {
        let f = llh_file(LLH_CSV);
        let samples = load_llh(f.path(), TimeWindow::new(Some(60.0), None), &[]).unwrap();
        let dates: Vec<f64> = samples.iter().map(|s| s.date).collect();
        assert_eq!(dates, vec![60.0, 120.0]);
    }
}
