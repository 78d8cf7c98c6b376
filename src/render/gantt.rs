//! Gantt chart of one instance: jobs on machines over time, optionally with
//! machines that are off or switching.

use super::{Marker, Panel, Tile, Tint};
use crate::records::pstates::machine_intervals;
use crate::records::{InstanceData, JobRecord, PowerStateRoles, PstateChange, PstateRole, TimeWindow};

const ROLE_ORDER: [PstateRole; 3] = [
    PstateRole::Off,
    PstateRole::SwitchingOn,
    PstateRole::SwitchingOff,
];

/// What the chart is drawn from
enum GanttKind<'a> {
    Plain,
    WithPowerStates {
        changes: &'a [PstateChange],
        roles: &'a PowerStateRoles,
    },
}

pub(super) fn render(
    panel: &mut Panel,
    instance: &InstanceData,
    roles: &PowerStateRoles,
    window: TimeWindow,
) {
    panel.set_title(format!("Gantt chart: {}", instance.name));
    panel.y_desc = Some("Machines".to_string());

    let jobs = instance.jobs.as_deref().unwrap_or_default();
    let kind = match instance.pstates.as_deref() {
        Some(changes) => GanttKind::WithPowerStates { changes, roles },
        None => GanttKind::Plain,
    };

    // State tiles go first so that jobs are drawn over them
    if let GanttKind::WithPowerStates { changes, roles } = kind {
        draw_power_states(panel, jobs, changes, roles, window);
    }
    draw_jobs(panel, jobs, window);
}

fn draw_jobs(panel: &mut Panel, jobs: &[JobRecord], window: TimeWindow) {
    for (index, job) in jobs.iter().enumerate() {
        let Some((start, finish)) = job.execution_span() else {
            continue;
        };
        let Some(x) = window.clip(start, finish) else {
            continue;
        };
        for &(lo, hi) in job.allocated_resources.ranges() {
            panel.add_tile(Tile {
                x,
                y: (f64::from(lo), f64::from(hi) + 1.0),
                tint: Tint::Job(index),
            });
        }
    }
}

fn draw_power_states(
    panel: &mut Panel,
    jobs: &[JobRecord],
    changes: &[PstateChange],
    roles: &PowerStateRoles,
    window: TimeWindow,
) {
    let end_time = jobs
        .iter()
        .filter_map(|j| j.finish_time)
        .chain(changes.iter().map(|c| c.time))
        .fold(f64::NEG_INFINITY, f64::max);

    let mut drawn = [false; ROLE_ORDER.len()];
    for interval in machine_intervals(changes, end_time) {
        let Some(role) = roles.classify(interval.pstate) else {
            continue;
        };
        let Some(x) = window.clip(interval.start, interval.end) else {
            continue;
        };
        let machine = f64::from(interval.machine);
        panel.add_tile(Tile {
            x,
            y: (machine, machine + 1.0),
            tint: Tint::Role(role),
        });
        if let Some(slot) = ROLE_ORDER.iter().position(|r| *r == role) {
            drawn[slot] = true;
        }
    }

    for (role, _) in ROLE_ORDER.iter().zip(drawn).filter(|(_, d)| *d) {
        panel.add_legend(role.label(), Tint::Role(*role), Marker::Square);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn job(id: &str, start: f64, finish: f64, resources: &str) -> JobRecord {
        JobRecord {
            job_id: id.to_string(),
            submission_time: 0.0,
            waiting_time: Some(start),
            starting_time: Some(start),
            finish_time: Some(finish),
            allocated_resources: resources.parse().unwrap(),
        }
    }

    fn set(states: &[i32]) -> BTreeSet<i32> {
        states.iter().copied().collect()
    }

    #[test]
    fn plain_chart_draws_one_tile_per_range() {
        let instance = InstanceData {
            name: "fcfs".to_string(),
            jobs: Some(vec![job("1", 0.0, 10.0, "0-1 4"), job("2", 5.0, 8.0, "2")]),
            ..InstanceData::default()
        };
        let mut panel = Panel::default();
        render(&mut panel, &instance, &PowerStateRoles::default(), TimeWindow::default());

        assert_eq!(panel.title, "Gantt chart: fcfs");
        assert!(panel.legend.is_empty());
        assert_eq!(
            panel.tiles,
            vec![
                Tile { x: (0.0, 10.0), y: (0.0, 2.0), tint: Tint::Job(0) },
                Tile { x: (0.0, 10.0), y: (4.0, 5.0), tint: Tint::Job(0) },
                Tile { x: (5.0, 8.0), y: (2.0, 3.0), tint: Tint::Job(1) },
            ]
        );
    }

    #[test]
    fn jobs_are_clipped_to_the_window() {
        let instance = InstanceData {
            name: "fcfs".to_string(),
            jobs: Some(vec![job("1", 0.0, 10.0, "0"), job("2", 12.0, 20.0, "0")]),
            ..InstanceData::default()
        };
        let mut panel = Panel::default();
        let window = TimeWindow::new(Some(5.0), Some(11.0));
        render(&mut panel, &instance, &PowerStateRoles::default(), window);

        assert_eq!(panel.tiles.len(), 1);
        assert_eq!(panel.tiles[0].x, (5.0, 10.0));
    }

    #[test]
    fn power_states_are_drawn_under_jobs() {
        let changes = vec![
            PstateChange {
                time: 0.0,
                machines: "0-1".parse().unwrap(),
                new_pstate: 0,
            },
            PstateChange {
                time: 2.0,
                machines: "1".parse().unwrap(),
                new_pstate: 13,
            },
        ];
        let instance = InstanceData {
            name: "easy".to_string(),
            jobs: Some(vec![job("1", 0.0, 10.0, "0")]),
            pstates: Some(changes),
            ..InstanceData::default()
        };
        let roles = PowerStateRoles::new(set(&[13]), set(&[14]), set(&[15])).unwrap();
        let mut panel = Panel::default();
        render(&mut panel, &instance, &roles, TimeWindow::default());

        assert_eq!(
            panel.tiles,
            vec![
                Tile { x: (2.0, 10.0), y: (1.0, 2.0), tint: Tint::Role(PstateRole::Off) },
                Tile { x: (0.0, 10.0), y: (0.0, 1.0), tint: Tint::Job(0) },
            ]
        );
        let labels: Vec<&str> = panel.legend.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["OFF"]);
    }
}
