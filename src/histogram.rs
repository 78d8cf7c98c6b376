//! Histogram of the energy values reported by probe events in a simulation
//! log.

use crate::display;
use crate::error::PlotError;
use anyhow::{Context, Result};
use log::{error, info};
use plotters::prelude::*;
use std::fs;
use std::io;
use std::path::Path;

pub const MARKER: &str = "Event: ProbeDataEmittedEvent";
pub const TITLE: &str = "Distribution of consumed energy values (zeros excluded)";

/// Collect the non-zero values printed after each probe event.
///
/// A probe block starts on a line beginning with [`MARKER`] and ends on the
/// first blank line. Inside it, lines that are not plain decimals, or too
/// large to be finite, are skipped.
pub fn scrape_energy_values(text: &str) -> Vec<f64> {
    let mut values = Vec::new();
    let mut recording = false;

    for line in text.lines().map(str::trim) {
        if line.starts_with(MARKER) {
            recording = true;
        } else if recording {
            if is_plain_decimal(line) {
                match line.parse::<f64>() {
                    Ok(value) if value != 0.0 && value.is_finite() => values.push(value),
                    _ => {}
                }
            } else if line.is_empty() {
                recording = false;
            }
        }
    }

    values
}

/// Digits with at most one decimal point, no sign or exponent
fn is_plain_decimal(s: &str) -> bool {
    let mut digits = 0;
    let mut dots = 0;
    for c in s.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }
    digits > 0 && dots <= 1
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `counts.len() + 1` increasing bin edges
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
}

impl Histogram {
    /// One bin per distinct value, evenly spread between the extremes.
    ///
    /// A single distinct value `v` gets the bin `[v - 1, v + 1]`. Every bin is
    /// half-open except the last, which includes its upper edge.
    pub fn from_values(values: &[f64]) -> Result<Self, PlotError> {
        let mut distinct: Vec<f64> = values.to_vec();
        distinct.sort_by(f64::total_cmp);
        distinct.dedup();

        let (Some(&min), Some(&max)) = (distinct.first(), distinct.last()) else {
            return Err(PlotError::NoHistogramValues { marker: MARKER });
        };

        let edges = if distinct.len() > 1 {
            linspace(min, max, distinct.len() + 1)
        } else {
            vec![min - 1.0, max + 1.0]
        };

        let bins = edges.len() - 1;
        let mut counts = vec![0; bins];
        for &value in values {
            // Index of the last edge not above the value
            let bin = edges.partition_point(|e| *e <= value).saturating_sub(1);
            counts[bin.min(bins - 1)] += 1;
        }

        Ok(Self { edges, counts })
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    let steps = (count - 1) as f64;
    (0..count)
        .map(|i| {
            if i + 1 == count {
                end
            } else {
                start + (end - start) * i as f64 / steps
            }
        })
        .collect()
}

pub fn write_svg(histogram: &Histogram, path: &Path) -> Result<()> {
    let (Some(&x_min), Some(&x_max)) = (histogram.edges.first(), histogram.edges.last()) else {
        return Ok(());
    };
    let y_max = histogram.counts.iter().copied().max().unwrap_or(0) as f64 * 1.1;

    let root = SVGBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(TITLE, ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, 0f64..y_max.max(1.0))?;

    chart.configure_mesh()
        .disable_x_mesh()
        .x_desc("Energy values (J)")
        .y_desc("Frequency")
        .draw()?;

    let bars = histogram.edges.windows(2).zip(&histogram.counts);
    chart.draw_series(bars.clone().map(|(edge, &count)| {
        Rectangle::new([(edge[0], 0.0), (edge[1], count as f64)], BLUE.mix(0.7).filled())
    }))?;
    chart.draw_series(bars.map(|(edge, &count)| {
        Rectangle::new([(edge[0], 0.0), (edge[1], count as f64)], BLACK.stroke_width(1))
    }))?;

    root.present()
        .with_context(|| format!("Failed to write histogram to {}", path.display()))?;
    info!("Histogram written to {}", path.display());
    Ok(())
}

fn plot(text: &str, output: Option<&Path>) -> Result<()> {
    let values = scrape_energy_values(text);
    let histogram = Histogram::from_values(&values)?;
    info!(
        "{} value(s) in {} bin(s)",
        histogram.total(),
        histogram.counts.len()
    );

    match output {
        Some(path) => write_svg(&histogram, path),
        None => display::show_histogram(&histogram),
    }
}

/// Run the `histogram` command.
///
/// Failures are reported but never make the command fail.
pub fn run(input: &Path, output: Option<&Path>) {
    let text = match fs::read_to_string(input) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            error!("Input file '{}' not found", input.display());
            return;
        }
        Err(e) => {
            error!("Error: {}", e);
            return;
        }
    };

    if let Err(e) = plot(&text, output) {
        error!("Error: {:#}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
Simulation started
Event: ProbeDataEmittedEvent
12.5
0
not a number
-3
7

42
Event: ProbeDataEmittedEvent (probe 2)
  12.5
1e3
.5
";

    #[test]
    fn scrapes_values_inside_probe_blocks() {
        assert_eq!(scrape_energy_values(LOG), vec![12.5, 7.0, 12.5, 0.5]);
    }

    #[test]
    fn overflowing_values_are_skipped() {
        let huge = "9".repeat(400);
        let log = format!("{MARKER}\n{huge}\n3\n");
        assert_eq!(scrape_energy_values(&log), vec![3.0]);

        let histogram = Histogram::from_values(&scrape_energy_values(&log)).unwrap();
        assert!(histogram.edges.iter().all(|e| e.is_finite()));
    }

    #[test]
    fn nothing_before_a_marker_is_recorded() {
        assert!(scrape_energy_values("1\n2\n3\n").is_empty());
    }

    #[test]
    fn plain_decimals_only() {
        assert!(is_plain_decimal("12"));
        assert!(is_plain_decimal("1.5"));
        assert!(is_plain_decimal("5."));
        assert!(!is_plain_decimal("1.2.3"));
        assert!(!is_plain_decimal("-1"));
        assert!(!is_plain_decimal("."));
        assert!(!is_plain_decimal(""));
    }

    #[test]
    fn one_bin_per_distinct_value() {
        let histogram = Histogram::from_values(&[1.0, 2.0, 2.0, 4.0]).unwrap();
        assert_eq!(histogram.edges, vec![1.0, 2.0, 3.0, 4.0]);
        // The last bin is closed on the right
        assert_eq!(histogram.counts, vec![1, 2, 1]);
        assert_eq!(histogram.total(), 4);
    }

    #[test]
    fn single_value_is_widened() {
        let histogram = Histogram::from_values(&[5.0, 5.0]).unwrap();
        assert_eq!(histogram.edges, vec![4.0, 6.0]);
        assert_eq!(histogram.counts, vec![2]);
    }

    #[test]
    fn no_values_is_an_error() {
        assert!(matches!(
            Histogram::from_values(&[]),
            Err(PlotError::NoHistogramValues { .. })
        ));
    }

    #[test]
    fn run_writes_svg() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("energy_data.csv");
        let output = dir.path().join("histogram.svg");
        fs::write(&input, LOG).unwrap();

        run(&input, Some(&output));
        let svg = fs::read_to_string(&output).unwrap();
        assert!(svg.contains("Distribution of consumed energy values"));
    }

    #[test]
    fn run_reports_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("histogram.svg");
        run(&dir.path().join("missing.csv"), Some(&output));
        assert!(!output.exists());
    }
}
