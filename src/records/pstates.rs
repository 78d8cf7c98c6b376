//! Power-state changes of compute machines and their role classification.

use super::intervals::IntervalSet;
use super::read_records;
use crate::error::PlotError;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const REQUIRED_COLUMNS: [&str; 3] = ["time", "machine_id", "new_pstate"];

/// A set of machines switching to a new power state at `time`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PstateChange {
    pub time: f64,
    #[serde(rename = "machine_id")]
    pub machines: IntervalSet,
    pub new_pstate: i32,
}

/// Load every power-state change of a file.
///
/// Changes are never windowed: the state of a machine at any instant depends
/// on the whole history before it.
pub fn load_pstates(path: &Path) -> Result<Vec<PstateChange>, PlotError> {
    read_records(path, &REQUIRED_COLUMNS)
}

/// Role of a power state in the Gantt chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PstateRole {
    Off,
    SwitchingOn,
    SwitchingOff,
}

impl PstateRole {
    pub fn label(&self) -> &'static str {
        match self {
            PstateRole::Off => "OFF",
            PstateRole::SwitchingOn => "Switching on",
            PstateRole::SwitchingOff => "Switching off",
        }
    }
}

/// Caller-supplied partition of power states into roles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PowerStateRoles {
    off: BTreeSet<i32>,
    switch_on: BTreeSet<i32>,
    switch_off: BTreeSet<i32>,
}

impl PowerStateRoles {
    /// Build the classification, failing if a state appears in two roles.
    pub fn new(
        off: BTreeSet<i32>,
        switch_on: BTreeSet<i32>,
        switch_off: BTreeSet<i32>,
    ) -> Result<Self, PlotError> {
        let pairs = [
            ("off", &off, "switchon", &switch_on),
            ("off", &off, "switchoff", &switch_off),
            ("switchon", &switch_on, "switchoff", &switch_off),
        ];
        for (first, a, second, b) in pairs {
            let shared: Vec<i32> = a.intersection(b).copied().collect();
            if !shared.is_empty() {
                return Err(PlotError::PowerStateCollision {
                    first,
                    second,
                    states: shared,
                });
            }
        }

        Ok(Self {
            off,
            switch_on,
            switch_off,
        })
    }

    pub fn classify(&self, pstate: i32) -> Option<PstateRole> {
        if self.off.contains(&pstate) {
            Some(PstateRole::Off)
        } else if self.switch_on.contains(&pstate) {
            Some(PstateRole::SwitchingOn)
        } else if self.switch_off.contains(&pstate) {
            Some(PstateRole::SwitchingOff)
        } else {
            None
        }
    }
}

/// Time a single machine spent in one power state
#[derive(Debug, Clone, PartialEq)]
pub struct PstateInterval {
    pub machine: u32,
    pub start: f64,
    pub end: f64,
    pub pstate: i32,
}

/// Turn a change log into per-machine state intervals.
///
/// The state reached by the last change of each machine lasts until
/// `end_time`. Zero-length intervals are dropped.
pub fn machine_intervals(changes: &[PstateChange], end_time: f64) -> Vec<PstateInterval> {
    let mut ordered: Vec<&PstateChange> = changes.iter().collect();
    ordered.sort_by(|a, b| a.time.total_cmp(&b.time));

    let mut current: BTreeMap<u32, (i32, f64)> = BTreeMap::new();
    let mut intervals = Vec::new();

    for change in ordered {
        for machine in change.machines.iter() {
            if let Some((pstate, since)) = current.insert(machine, (change.new_pstate, change.time)) {
                if change.time > since {
                    intervals.push(PstateInterval {
                        machine,
                        start: since,
                        end: change.time,
                        pstate,
                    });
                }
            }
        }
    }

    for (machine, (pstate, since)) in current {
        if end_time > since {
            intervals.push(PstateInterval {
                machine,
                start: since,
                end: end_time,
                pstate,
            });
        }
    }

    intervals
}
