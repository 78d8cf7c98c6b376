//! Cumulative energy samples and the power series derived from them.

use super::{read_records, TimeWindow};
use crate::error::PlotError;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

const REQUIRED_COLUMNS: [&str; 2] = ["time", "energy"];

/// Cumulative energy (J) at a given simulation time (s).
///
/// The `event_type`, `wattmin` and `epower` columns of batsim's energy trace
/// are not kept.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct EnergySample {
    pub time: f64,
    pub energy: f64,
}

/// Mean power (W) over the interval ending at `time`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerSample {
    pub time: f64,
    pub power: f64,
}

/// Load an energy trace, keeping samples inside `window`
pub fn load_energy(path: &Path, window: TimeWindow) -> Result<Vec<EnergySample>, PlotError> {
    let samples: Vec<EnergySample> = read_records(path, &REQUIRED_COLUMNS)?;
    Ok(samples
        .into_iter()
        .filter(|s| window.contains(s.time))
        .collect())
}

/// Drop every sample whose timestamp was already seen, keeping the first one.
pub fn dedup_by_time(samples: &[EnergySample]) -> Vec<EnergySample> {
    let mut seen = HashSet::new();
    samples
        .iter()
        .filter(|s| seen.insert(s.time.to_bits()))
        .copied()
        .collect()
}

/// Differentiate a cumulative energy series.
///
/// Yields one sample per pair of consecutive deduplicated samples, so `n`
/// distinct timestamps give `n - 1` power values. Non-finite quotients are
/// skipped.
pub fn power_series(samples: &[EnergySample]) -> Vec<PowerSample> {
    dedup_by_time(samples)
        .windows(2)
        .filter_map(|pair| {
            let (prev, cur) = (pair[0], pair[1]);
            let power = (cur.energy - prev.energy) / (cur.time - prev.time);
            power.is_finite().then_some(PowerSample {
                time: cur.time,
                power,
            })
        })
        .collect()
}
