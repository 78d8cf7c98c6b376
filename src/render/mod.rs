//! Backend-independent figure model.
//!
//! Renderers turn loaded records into [`Panel`]s made of series and tiles.
//! The SVG writer and the terminal viewer both draw from the same
//! [`Figure`], so the two outputs never disagree on what is shown.

mod gantt;
mod metrics;

use crate::layout::{Feature, Margins, PanelPlan, PlotConfig};
use crate::records::{InstanceData, LlhMetric, PstateRole, TimeWindow};
use log::{debug, warn};

/// How the points of a series are joined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawStyle {
    Line,
    /// The value at `x[i]` holds over `(x[i-1], x[i]]`
    StepPre,
    /// The value at `x[i]` holds over `[x[i], x[i+1])`
    StepPost,
    Scatter,
}

/// Colour selector, resolved to real colours by each backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tint {
    Instance(usize),
    Reference,
    Job(usize),
    Role(PstateRole),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: Option<String>,
    pub style: DrawStyle,
    pub tint: Tint,
    pub stroke: u32,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    pub fn new(style: DrawStyle, tint: Tint, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: None,
            style,
            tint,
            stroke: 1,
            points,
        }
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn stroke(mut self, width: u32) -> Self {
        self.stroke = width;
        self
    }

    /// Vertices of the polyline to draw, with steps expanded
    pub fn path(&self) -> Vec<(f64, f64)> {
        match self.style {
            DrawStyle::StepPre => step_pre(&self.points),
            DrawStyle::StepPost => step_post(&self.points),
            DrawStyle::Line | DrawStyle::Scatter => self.points.clone(),
        }
    }
}

/// Filled rectangle in data coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub x: (f64, f64),
    pub y: (f64, f64),
    pub tint: Tint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Line,
    Dot,
    Square,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub tint: Tint,
    pub marker: Marker,
}

/// One subplot. Legend entries are kept in draw order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Panel {
    pub title: String,
    pub y_desc: Option<String>,
    pub series: Vec<Series>,
    pub tiles: Vec<Tile>,
    pub legend: Vec<LegendEntry>,
}

impl Panel {
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn add_series(&mut self, series: Series) {
        if let Some(label) = &series.label {
            let marker = match series.style {
                DrawStyle::Scatter => Marker::Dot,
                _ => Marker::Line,
            };
            self.legend.push(LegendEntry {
                label: label.clone(),
                tint: series.tint,
                marker,
            });
        }
        self.series.push(series);
    }

    pub fn add_tile(&mut self, tile: Tile) {
        self.tiles.push(tile);
    }

    pub fn add_legend(&mut self, label: impl Into<String>, tint: Tint, marker: Marker) {
        self.legend.push(LegendEntry {
            label: label.into(),
            tint,
            marker,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty()) && self.tiles.is_empty()
    }

    /// Horizontal span covered by the panel's data
    pub fn x_extent(&self) -> Option<(f64, f64)> {
        let xs = self
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.0))
            .chain(self.tiles.iter().flat_map(|t| [t.x.0, t.x.1]));
        bounds(xs)
    }

    /// Vertical range to display.
    ///
    /// Series get 5% of padding on both sides; a flat series is widened by
    /// one unit. Tiles alone are shown edge to edge.
    pub fn y_range(&self) -> (f64, f64) {
        let series_ys = self
            .series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.1));
        let tile_ys = self.tiles.iter().flat_map(|t| [t.y.0, t.y.1]);

        let has_series = self.series.iter().any(|s| !s.points.is_empty());
        let Some((lo, hi)) = bounds(series_ys.chain(tile_ys)) else {
            return (0.0, 1.0);
        };

        if lo == hi {
            (lo - 1.0, hi + 1.0)
        } else if has_series {
            let pad = (hi - lo) * 0.05;
            (lo - pad, hi + pad)
        } else {
            (lo, hi)
        }
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Panels stacked top to bottom, sharing the time axis
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub panels: Vec<Panel>,
    pub margins: Margins,
    pub window: TimeWindow,
}

impl Figure {
    pub fn new(plan: &PanelPlan, window: TimeWindow) -> Self {
        Self {
            panels: vec![Panel::default(); plan.panel_count()],
            margins: plan.margins,
            window,
        }
    }

    /// Shared x range: the union of panel extents, with the time window
    /// bounds taking precedence where given.
    pub fn x_range(&self) -> (f64, f64) {
        let extent = bounds(
            self.panels
                .iter()
                .filter_map(Panel::x_extent)
                .flat_map(|(lo, hi)| [lo, hi]),
        );
        let (lo, hi) = extent.unwrap_or((0.0, 1.0));
        let lo = self.window.min.unwrap_or(lo);
        let hi = self.window.max.unwrap_or(hi);
        if hi > lo {
            (lo, hi)
        } else {
            (lo, lo + 1.0)
        }
    }
}

/// Expand points so that each value holds over the interval ending at it
pub fn step_pre(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut path = Vec::with_capacity(points.len() * 2);
    for (i, &(x, y)) in points.iter().enumerate() {
        if i > 0 {
            path.push((points[i - 1].0, y));
        }
        path.push((x, y));
    }
    path
}

/// Expand points so that each value holds until the next point
pub fn step_post(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut path = Vec::with_capacity(points.len() * 2);
    for (i, &(x, y)) in points.iter().enumerate() {
        if i > 0 {
            path.push((x, points[i - 1].1));
        }
        path.push((x, y));
    }
    path
}

/// Fill every planned panel from the loaded instances.
pub fn render(plan: &PanelPlan, config: &PlotConfig, data: &[InstanceData]) -> Figure {
    let mut figure = Figure::new(plan, config.window);

    for (planned, panel) in plan.panels.iter().zip(figure.panels.iter_mut()) {
        match planned.feature {
            Feature::Gantt => {
                if let Some(instance) = planned.instance.and_then(|i| data.get(i)) {
                    gantt::render(panel, instance, &plan.roles, config.window);
                }
            }
            Feature::Power => metrics::power(panel, data),
            Feature::Energy => metrics::energy(panel, data),
            Feature::Unresponsiveness => {
                metrics::unresponsiveness(panel, data, config.llh_bound, config.window)
            }
            Feature::LoadInQueue => metrics::queue(
                panel,
                data,
                LlhMetric::LoadInQueue,
                "Load in queue (nb_res * seconds)",
                None,
            ),
            Feature::JobsInQueue => metrics::queue(
                panel,
                data,
                LlhMetric::NbJobsInQueue,
                "Number of jobs in queue",
                None,
            ),
            Feature::PriorityJobSize => metrics::queue(
                panel,
                data,
                LlhMetric::FirstJobSize,
                "Number of requested resources of the priority job",
                None,
            ),
            Feature::PriorityJobWaitingTime => metrics::queue(
                panel,
                data,
                LlhMetric::PriorityJobExpectedWaitingTime,
                "Expected waiting time of the priority job (s)",
                config.priority_wait_bound,
            ),
            Feature::PriorityJobImminence => metrics::queue(
                panel,
                data,
                LlhMetric::PriorityJobStartingExpectedSoon,
                "Is the priority job expected to start soon?",
                None,
            ),
        }
        if panel.is_empty() {
            warn!("Panel '{}' has no data in the time window", panel.title);
        } else {
            debug!(
                "Panel '{}': {} series, {} tiles",
                panel.title,
                panel.series.len(),
                panel.tiles.len()
            );
        }
    }

    figure
}
