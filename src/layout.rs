//! Panel layout planning.
//!
//! [`plan`] is a pure function from the plotting configuration to either an
//! ordered list of panels or a typed error. Nothing is read from disk here;
//! only the shape of the configuration is validated.

use crate::error::PlotError;
use crate::records::{LlhMetric, PowerStateRoles, TimeWindow};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// A kind of panel the user can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Gantt,
    Power,
    Energy,
    Unresponsiveness,
    LoadInQueue,
    JobsInQueue,
    PriorityJobSize,
    PriorityJobWaitingTime,
    PriorityJobImminence,
}

impl Feature {
    /// Order in which panels are stacked, top to bottom
    pub const PRECEDENCE: [Feature; 9] = [
        Feature::Gantt,
        Feature::Power,
        Feature::Energy,
        Feature::Unresponsiveness,
        Feature::LoadInQueue,
        Feature::JobsInQueue,
        Feature::PriorityJobSize,
        Feature::PriorityJobWaitingTime,
        Feature::PriorityJobImminence,
    ];

    /// Command-line flag requesting the feature
    pub fn flag(&self) -> &'static str {
        match self {
            Feature::Gantt => "gantt",
            Feature::Power => "power",
            Feature::Energy => "energy",
            Feature::Unresponsiveness => "llh",
            Feature::LoadInQueue => "load-in-queue",
            Feature::JobsInQueue => "nb-jobs-in-queue",
            Feature::PriorityJobSize => "priority-job-size",
            Feature::PriorityJobWaitingTime => "priority-job-expected-waiting-time",
            Feature::PriorityJobImminence => "priority-job-starting-expected-soon",
        }
    }

    /// File list the feature is drawn from
    pub fn source(&self) -> Source {
        match self {
            Feature::Gantt => Source::Jobs,
            Feature::Power | Feature::Energy => Source::Energy,
            _ => Source::Llh,
        }
    }

    /// LLH column the feature plots, if any
    pub fn llh_metric(&self) -> Option<LlhMetric> {
        match self {
            Feature::Unresponsiveness => Some(LlhMetric::LiquidLoadHorizon),
            Feature::LoadInQueue => Some(LlhMetric::LoadInQueue),
            Feature::JobsInQueue => Some(LlhMetric::NbJobsInQueue),
            Feature::PriorityJobSize => Some(LlhMetric::FirstJobSize),
            Feature::PriorityJobWaitingTime => Some(LlhMetric::PriorityJobExpectedWaitingTime),
            Feature::PriorityJobImminence => Some(LlhMetric::PriorityJobStartingExpectedSoon),
            Feature::Gantt | Feature::Power | Feature::Energy => None,
        }
    }

    /// Whether the legend column on the right needs extra room
    fn widens_legend(&self) -> bool {
        matches!(
            self,
            Feature::Power | Feature::Energy | Feature::Unresponsiveness
        )
    }
}

/// Input file lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Jobs,
    Energy,
    Llh,
}

impl Source {
    pub fn flag(&self) -> &'static str {
        match self {
            Source::Jobs => "jobsCSV",
            Source::Energy => "energyCSV",
            Source::Llh => "llhCSV",
        }
    }
}

/// Independent feature toggles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Features {
    pub gantt: bool,
    pub power: bool,
    pub energy: bool,
    pub llh: bool,
    pub load_in_queue: bool,
    pub nb_jobs_in_queue: bool,
    pub priority_job_size: bool,
    pub priority_job_waiting_time: bool,
    pub priority_job_imminence: bool,
}

impl Features {
    pub fn contains(&self, feature: Feature) -> bool {
        match feature {
            Feature::Gantt => self.gantt,
            Feature::Power => self.power,
            Feature::Energy => self.energy,
            Feature::Unresponsiveness => self.llh,
            Feature::LoadInQueue => self.load_in_queue,
            Feature::JobsInQueue => self.nb_jobs_in_queue,
            Feature::PriorityJobSize => self.priority_job_size,
            Feature::PriorityJobWaitingTime => self.priority_job_waiting_time,
            Feature::PriorityJobImminence => self.priority_job_imminence,
        }
    }

    /// Requested features in precedence order
    pub fn requested(&self) -> Vec<Feature> {
        Feature::PRECEDENCE
            .into_iter()
            .filter(|f| self.contains(*f))
            .collect()
    }
}

/// Positionally aligned input files, one entry per instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceLists {
    pub jobs: Vec<PathBuf>,
    pub pstates: Vec<PathBuf>,
    pub energy: Vec<PathBuf>,
    pub llh: Vec<PathBuf>,
}

impl SourceLists {
    fn get(&self, source: Source) -> &[PathBuf] {
        match source {
            Source::Jobs => &self.jobs,
            Source::Energy => &self.energy,
            Source::Llh => &self.llh,
        }
    }
}

/// Everything the `plot` command was asked to do
#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    pub features: Features,
    pub sources: SourceLists,
    pub names: Vec<String>,
    pub off: BTreeSet<i32>,
    pub switch_on: BTreeSet<i32>,
    pub switch_off: BTreeSet<i32>,
    pub llh_bound: Option<f64>,
    pub priority_wait_bound: Option<f64>,
    pub window: TimeWindow,
    pub force_right_adjust: Option<f64>,
    pub summary: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            features: Features::default(),
            sources: SourceLists::default(),
            names: vec!["Unnamed".to_string()],
            off: BTreeSet::new(),
            switch_on: BTreeSet::new(),
            switch_off: BTreeSet::new(),
            llh_bound: None,
            priority_wait_bound: None,
            window: TimeWindow::default(),
            force_right_adjust: None,
            summary: false,
        }
    }
}

/// One named run and the files describing it
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub name: String,
    pub jobs: Option<PathBuf>,
    pub pstates: Option<PathBuf>,
    pub energy: Option<PathBuf>,
    pub llh: Option<PathBuf>,
}

/// One planned subplot. Gantt charts get one panel per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelSpec {
    pub feature: Feature,
    pub instance: Option<usize>,
}

/// Figure margins as fractions of the figure size.
///
/// `right` is the x coordinate where the plots end and the legend column
/// starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            left: 0.05,
            right: 0.95,
            top: 0.95,
            bottom: 0.05,
        }
    }
}

/// A validated drawing plan
#[derive(Debug, Clone, PartialEq)]
pub struct PanelPlan {
    pub panels: Vec<PanelSpec>,
    pub instances: Vec<Instance>,
    pub roles: PowerStateRoles,
    pub margins: Margins,
}

impl PanelPlan {
    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// No feature requested; not an error
    Nothing,
    Draw(PanelPlan),
}

/// Validate `config` and lay out its panels.
pub fn plan(config: &PlotConfig) -> Result<Plan, PlotError> {
    let roles = PowerStateRoles::new(
        config.off.clone(),
        config.switch_on.clone(),
        config.switch_off.clone(),
    )?;

    let requested = config.features.requested();
    for feature in &requested {
        let source = feature.source();
        if config.sources.get(source).is_empty() {
            return Err(PlotError::MissingSource {
                feature: feature.flag(),
                required: source.flag(),
            });
        }
    }

    let instance_count = infer_instance_count(&config.sources)?;

    if requested.is_empty() {
        return Ok(Plan::Nothing);
    }

    if config.names.len() != instance_count {
        return Err(PlotError::NameCountMismatch {
            names: config.names.len(),
            instances: instance_count,
        });
    }

    let mut panels = Vec::new();
    for feature in &requested {
        match feature {
            Feature::Gantt => panels.extend((0..instance_count).map(|i| PanelSpec {
                feature: Feature::Gantt,
                instance: Some(i),
            })),
            _ => panels.push(PanelSpec {
                feature: *feature,
                instance: None,
            }),
        }
    }

    let mut margins = Margins::default();
    if requested.iter().any(Feature::widens_legend) {
        margins.right = margins.right.min(0.85);
    }
    if let Some(right) = config.force_right_adjust {
        margins.right = right;
    }

    let sources = &config.sources;
    let instances = config
        .names
        .iter()
        .enumerate()
        .map(|(i, name)| Instance {
            name: name.clone(),
            jobs: sources.jobs.get(i).cloned(),
            pstates: sources.pstates.get(i).cloned(),
            energy: sources.energy.get(i).cloned(),
            llh: sources.llh.get(i).cloned(),
        })
        .collect();

    Ok(Plan::Draw(PanelPlan {
        panels,
        instances,
        roles,
        margins,
    }))
}

/// Count instances from whichever file lists are present, requiring them to
/// agree. When both are given, power-state files must pair one-to-one with
/// job files.
fn infer_instance_count(sources: &SourceLists) -> Result<usize, PlotError> {
    let paired = !sources.jobs.is_empty() && !sources.pstates.is_empty();
    if paired && sources.pstates.len() != sources.jobs.len() {
        return Err(PlotError::InstanceCountMismatch {
            found_in: "pstatesCSV",
            found: sources.pstates.len(),
            reference_in: "jobsCSV",
            reference: sources.jobs.len(),
        });
    }

    let mut inferred: Option<(Source, usize)> = None;
    for source in [Source::Jobs, Source::Energy, Source::Llh] {
        let count = sources.get(source).len();
        if count == 0 {
            continue;
        }
        match inferred {
            Some((reference, expected)) if expected != count => {
                return Err(PlotError::InstanceCountMismatch {
                    found_in: source.flag(),
                    found: count,
                    reference_in: reference.flag(),
                    reference: expected,
                });
            }
            Some(_) => {}
            None => inferred = Some((source, count)),
        }
    }

    Ok(inferred.map_or(0, |(_, count)| count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(prefix: &str, n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("{prefix}{i}.csv"))).collect()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn draw(config: &PlotConfig) -> PanelPlan {
        match plan(config).unwrap() {
            Plan::Draw(p) => p,
            Plan::Nothing => panic!("expected a drawing plan"),
        }
    }

    #[test]
    fn nothing_requested_is_not_an_error() {
        assert_eq!(plan(&PlotConfig::default()).unwrap(), Plan::Nothing);

        let config = PlotConfig {
            sources: SourceLists {
                jobs: paths("jobs", 2),
                ..SourceLists::default()
            },
            ..PlotConfig::default()
        };
        assert_eq!(plan(&config).unwrap(), Plan::Nothing);
    }

    #[test]
    fn feature_without_source_is_rejected() {
        let config = PlotConfig {
            features: Features {
                power: true,
                ..Features::default()
            },
            ..PlotConfig::default()
        };
        let err = plan(&config).unwrap_err();
        assert!(matches!(
            err,
            PlotError::MissingSource {
                feature: "power",
                required: "energyCSV"
            }
        ));

        let config = PlotConfig {
            features: Features {
                priority_job_size: true,
                ..Features::default()
            },
            sources: SourceLists {
                energy: paths("energy", 1),
                ..SourceLists::default()
            },
            ..PlotConfig::default()
        };
        assert!(matches!(
            plan(&config).unwrap_err(),
            PlotError::MissingSource {
                required: "llhCSV",
                ..
            }
        ));
    }

    #[test]
    fn instance_counts_must_agree() {
        let config = PlotConfig {
            features: Features {
                energy: true,
                ..Features::default()
            },
            sources: SourceLists {
                jobs: paths("jobs", 2),
                energy: paths("energy", 3),
                ..SourceLists::default()
            },
            names: names(&["a", "b"]),
            ..PlotConfig::default()
        };
        match plan(&config).unwrap_err() {
            PlotError::InstanceCountMismatch {
                found_in,
                found,
                reference_in,
                reference,
            } => {
                assert_eq!((found_in, found), ("energyCSV", 3));
                assert_eq!((reference_in, reference), ("jobsCSV", 2));
            }
            other => panic!("unexpected error: {other}"),
        }

        let config = PlotConfig {
            features: Features {
                llh: true,
                ..Features::default()
            },
            sources: SourceLists {
                energy: paths("energy", 1),
                llh: paths("llh", 2),
                ..SourceLists::default()
            },
            ..PlotConfig::default()
        };
        assert!(matches!(
            plan(&config).unwrap_err(),
            PlotError::InstanceCountMismatch { .. }
        ));
    }

    #[test]
    fn pstates_pair_with_jobs() {
        let config = PlotConfig {
            features: Features {
                gantt: true,
                ..Features::default()
            },
            sources: SourceLists {
                jobs: paths("jobs", 2),
                pstates: paths("pstates", 1),
                ..SourceLists::default()
            },
            names: names(&["a", "b"]),
            ..PlotConfig::default()
        };
        assert!(matches!(
            plan(&config).unwrap_err(),
            PlotError::InstanceCountMismatch {
                found_in: "pstatesCSV",
                ..
            }
        ));
    }

    #[test]
    fn pstates_without_jobs_are_not_counted() {
        let config = PlotConfig {
            features: Features {
                energy: true,
                ..Features::default()
            },
            sources: SourceLists {
                energy: paths("energy", 1),
                pstates: paths("pstates", 1),
                ..SourceLists::default()
            },
            ..PlotConfig::default()
        };
        let p = draw(&config);
        assert_eq!(p.panels.len(), 1);
        assert_eq!(p.panels[0].feature, Feature::Energy);
        assert_eq!(p.instances.len(), 1);
    }

    #[test]
    fn names_must_match_instances() {
        let config = PlotConfig {
            features: Features {
                gantt: true,
                ..Features::default()
            },
            sources: SourceLists {
                jobs: paths("jobs", 2),
                ..SourceLists::default()
            },
            names: names(&["a"]),
            ..PlotConfig::default()
        };
        assert!(matches!(
            plan(&config).unwrap_err(),
            PlotError::NameCountMismatch {
                names: 1,
                instances: 2
            }
        ));
    }

    #[test]
    fn role_collision_is_rejected() {
        let config = PlotConfig {
            off: [1, 2].into_iter().collect(),
            switch_on: [2, 3].into_iter().collect(),
            ..PlotConfig::default()
        };
        assert!(matches!(
            plan(&config).unwrap_err(),
            PlotError::PowerStateCollision { .. }
        ));
    }

    #[test]
    fn panels_follow_precedence_order() {
        let config = PlotConfig {
            features: Features {
                gantt: true,
                power: true,
                energy: true,
                llh: true,
                load_in_queue: true,
                nb_jobs_in_queue: true,
                priority_job_size: true,
                priority_job_waiting_time: true,
                priority_job_imminence: true,
            },
            sources: SourceLists {
                jobs: paths("jobs", 2),
                pstates: paths("pstates", 2),
                energy: paths("energy", 2),
                llh: paths("llh", 2),
            },
            names: names(&["fcfs", "easy"]),
            ..PlotConfig::default()
        };
        let p = draw(&config);

        assert_eq!(p.panel_count(), 10);
        assert_eq!(
            p.panels[0],
            PanelSpec {
                feature: Feature::Gantt,
                instance: Some(0)
            }
        );
        assert_eq!(p.panels[1].instance, Some(1));
        let rest: Vec<Feature> = p.panels[2..].iter().map(|s| s.feature).collect();
        assert_eq!(rest, Feature::PRECEDENCE[1..].to_vec());

        assert_eq!(p.instances.len(), 2);
        assert_eq!(p.instances[1].name, "easy");
        assert_eq!(p.instances[1].llh, Some(PathBuf::from("llh1.csv")));
        assert_eq!(p.instances[1].pstates, Some(PathBuf::from("pstates1.csv")));
    }

    #[test]
    fn margins_leave_room_for_legends() {
        let gantt_only = PlotConfig {
            features: Features {
                gantt: true,
                ..Features::default()
            },
            sources: SourceLists {
                jobs: paths("jobs", 1),
                ..SourceLists::default()
            },
            ..PlotConfig::default()
        };
        assert_eq!(draw(&gantt_only).margins, Margins::default());

        let with_power = PlotConfig {
            features: Features {
                power: true,
                ..gantt_only.features
            },
            sources: SourceLists {
                energy: paths("energy", 1),
                ..gantt_only.sources.clone()
            },
            ..gantt_only.clone()
        };
        assert_eq!(draw(&with_power).margins.right, 0.85);

        let forced = PlotConfig {
            force_right_adjust: Some(0.7),
            ..with_power
        };
        let margins = draw(&forced).margins;
        assert_eq!(margins.right, 0.7);
        assert_eq!(margins.left, 0.05);
    }
}
