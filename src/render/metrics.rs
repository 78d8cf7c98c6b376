//! Time-series panels: power, energy and the queue metrics of LLH traces.

use super::{DrawStyle, Panel, Series, Tint};
use crate::records::{InstanceData, LlhMetric, LlhSample, TimeWindow};

pub(super) fn power(panel: &mut Panel, data: &[InstanceData]) {
    panel.set_title("Power (W)");
    for (i, instance) in data.iter().enumerate() {
        let Some(power) = &instance.power else {
            continue;
        };
        let points = power.iter().map(|p| (p.time, p.power)).collect();
        panel.add_series(
            Series::new(DrawStyle::StepPre, Tint::Instance(i), points).labelled(&instance.name),
        );
    }
}

pub(super) fn energy(panel: &mut Panel, data: &[InstanceData]) {
    panel.set_title("Energy (J)");
    for (i, instance) in data.iter().enumerate() {
        let Some(energy) = &instance.energy else {
            continue;
        };
        let points = energy.iter().map(|s| (s.time, s.energy)).collect();
        panel.add_series(
            Series::new(DrawStyle::Line, Tint::Instance(i), points).labelled(&instance.name),
        );
    }
}

/// Liquid load horizon against the waiting time jobs actually had
pub(super) fn unresponsiveness(
    panel: &mut Panel,
    data: &[InstanceData],
    bound: Option<f64>,
    window: TimeWindow,
) {
    panel.set_title("Unresponsiveness estimation");
    for (i, instance) in data.iter().enumerate() {
        if let Some(llh) = &instance.llh {
            let points = metric_points(llh, LlhMetric::LiquidLoadHorizon);
            panel.add_series(
                Series::new(DrawStyle::Line, Tint::Instance(i), points)
                    .labelled(format!("{} LLH (s)", instance.name)),
            );
        }
        if let Some(jobs) = &instance.jobs {
            let points = jobs
                .iter()
                .filter(|j| window.contains(j.submission_time))
                .filter_map(|j| j.waiting_time.map(|w| (j.submission_time, w)))
                .collect();
            panel.add_series(
                Series::new(DrawStyle::Scatter, Tint::Instance(i), points)
                    .labelled(format!("{} Waiting Time (s)", instance.name)),
            );
        }
    }

    if let Some(bound) = bound {
        add_bound(panel, data, bound, format!("LLH bound ({bound:?})"));
    }
}

/// Step-post panel of one LLH column, with an optional horizontal bound
pub(super) fn queue(
    panel: &mut Panel,
    data: &[InstanceData],
    metric: LlhMetric,
    title: &str,
    bound: Option<f64>,
) {
    panel.set_title(title);
    for (i, instance) in data.iter().enumerate() {
        let Some(llh) = &instance.llh else {
            continue;
        };
        let points = metric_points(llh, metric);
        panel.add_series(
            Series::new(DrawStyle::StepPost, Tint::Instance(i), points).labelled(&instance.name),
        );
    }

    if let Some(bound) = bound {
        add_bound(panel, data, bound, format!("Bound ({bound:?})"));
    }
}

fn metric_points(samples: &[LlhSample], metric: LlhMetric) -> Vec<(f64, f64)> {
    samples
        .iter()
        .filter_map(|s| metric.value(s).map(|v| (s.date, v)))
        .collect()
}

/// Horizontal line spanning every LLH date of every instance
fn add_bound(panel: &mut Panel, data: &[InstanceData], bound: f64, label: String) {
    let dates = data
        .iter()
        .filter_map(|d| d.llh.as_deref())
        .flatten()
        .map(|s| s.date);
    let span = dates.fold(None, |acc: Option<(f64, f64)>, d| match acc {
        None => Some((d, d)),
        Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
    });
    let Some((first, last)) = span else {
        return;
    };

    panel.add_series(
        Series::new(
            DrawStyle::Line,
            Tint::Reference,
            vec![(first, bound), (last, bound)],
        )
        .labelled(label)
        .stroke(2),
    );
}
