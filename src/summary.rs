//! Per-instance run statistics printed with `--summary`.

use crate::records::{InstanceData, TimeWindow};
use num_format::{Locale, ToFormattedString};

/// Statistics of one instance. Fields are `None` when the source they are
/// computed from was not given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceSummary {
    pub name: String,
    pub jobs: Option<usize>,
    pub rejected: Option<usize>,
    pub mean_wait: Option<f64>,
    pub max_wait: Option<f64>,
    pub energy: Option<f64>,
    pub mean_power: Option<f64>,
    pub peak_power: Option<f64>,
    pub peak_llh: Option<f64>,
}

impl InstanceSummary {
    /// Summarize an instance, counting only jobs submitted inside `window`
    pub fn from_data(data: &InstanceData, window: TimeWindow) -> Self {
        let mut summary = InstanceSummary {
            name: data.name.clone(),
            ..Self::default()
        };

        if let Some(jobs) = &data.jobs {
            let jobs: Vec<_> = jobs
                .iter()
                .filter(|j| window.contains(j.submission_time))
                .collect();
            let waits: Vec<f64> = jobs
                .iter()
                .filter(|j| !j.is_rejected())
                .filter_map(|j| j.waiting_time)
                .collect();
            summary.jobs = Some(jobs.len());
            summary.rejected = Some(jobs.iter().filter(|j| j.is_rejected()).count());
            summary.mean_wait = mean(&waits);
            summary.max_wait = max(&waits);
        }

        if let Some(energy) = &data.energy {
            if let (Some(first), Some(last)) = (energy.first(), energy.last()) {
                let consumed = last.energy - first.energy;
                let duration = last.time - first.time;
                summary.energy = Some(consumed);
                summary.mean_power = (duration > 0.0).then(|| consumed / duration);
            }
        }

        if let Some(power) = &data.power {
            let values: Vec<f64> = power.iter().map(|p| p.power).collect();
            summary.peak_power = max(&values);
        }

        if let Some(llh) = &data.llh {
            let values: Vec<f64> = llh.iter().filter_map(|s| s.liquid_load_horizon).collect();
            summary.peak_llh = max(&values);
        }

        summary
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Format with thousands separators and one decimal
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let tenths = (value.abs() * 10.0).round() as u64;
    let sign = if value < 0.0 && tenths > 0 { "-" } else { "" };
    format!(
        "{}{}.{}",
        sign,
        (tenths / 10).to_formatted_string(&Locale::en),
        tenths % 10
    )
}

fn format_count(value: usize) -> String {
    value.to_formatted_string(&Locale::en)
}

fn field(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{} {}", format_number(v), unit),
        None => "n/a".to_string(),
    }
}

/// Lines of the summary report
pub fn report(summaries: &[InstanceSummary]) -> Vec<String> {
    let mut lines = vec![
        "=".repeat(60),
        "                      RUN SUMMARY".to_string(),
        "=".repeat(60),
    ];

    for summary in summaries {
        lines.push(format!("{}:", summary.name));
        if let (Some(jobs), Some(rejected)) = (summary.jobs, summary.rejected) {
            lines.push(format!(
                "  Jobs: {} ({} rejected)",
                format_count(jobs),
                format_count(rejected)
            ));
            lines.push(format!(
                "  Waiting time: mean {}, max {}",
                field(summary.mean_wait, "s"),
                field(summary.max_wait, "s")
            ));
        }
        if summary.energy.is_some() {
            lines.push(format!("  Energy consumed: {}", field(summary.energy, "J")));
            lines.push(format!(
                "  Power: mean {}, peak {}",
                field(summary.mean_power, "W"),
                field(summary.peak_power, "W")
            ));
        }
        if summary.peak_llh.is_some() {
            lines.push(format!("  Peak LLH: {}", field(summary.peak_llh, "s")));
        }
        lines.push(String::new());
    }

    lines.push("=".repeat(60));
    lines
}

pub fn print_summary(data: &[InstanceData], window: TimeWindow) {
    let summaries: Vec<InstanceSummary> = data
        .iter()
        .map(|d| InstanceSummary::from_data(d, window))
        .collect();
    println!();
    for line in report(&summaries) {
        println!("{}", line);
    }
}
