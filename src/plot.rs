//! SVG output of a rendered figure.

use crate::records::PstateRole;
use crate::render::{DrawStyle, Figure, LegendEntry, Marker, Panel, Tint};
use anyhow::{Context, Result};
use log::{info, warn};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

const FIGURE_WIDTH: u32 = 1400;
const PANEL_HEIGHT: u32 = 260;
const LEGEND_LINE_HEIGHT: i32 = 18;

/// Colour of a tint in SVG output
fn colour(tint: Tint) -> RGBAColor {
    match tint {
        Tint::Instance(i) => Palette99::pick(i).to_rgba(),
        Tint::Job(i) => Palette99::pick(i).mix(0.75),
        Tint::Reference => RED.to_rgba(),
        Tint::Role(PstateRole::Off) => RGBColor(60, 60, 60).to_rgba(),
        Tint::Role(PstateRole::SwitchingOn) => RGBColor(255, 165, 0).to_rgba(),
        Tint::Role(PstateRole::SwitchingOff) => RGBColor(148, 0, 211).to_rgba(),
    }
}

/// Pixel offset of a figure fraction
fn px(fraction: f64, total: u32) -> i32 {
    (fraction.clamp(0.0, 1.0) * f64::from(total)).round() as i32
}

/// Write `figure` to `path` as a single SVG document.
///
/// Panels are stacked vertically and share the x range. The legend of each
/// panel is drawn in a column to the right of it, starting at the right
/// margin.
pub fn write_svg(figure: &Figure, path: &Path) -> Result<()> {
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
    if !is_svg {
        warn!("{} has no .svg extension, writing SVG anyway", path.display());
    }

    let count = figure.panels.len().max(1);
    let margins = figure.margins;
    let plotted = (margins.top - margins.bottom).clamp(0.1, 1.0);
    let height = (count as f64 * f64::from(PANEL_HEIGHT) / plotted).round() as u32;

    let root = SVGBackend::new(path, (FIGURE_WIDTH, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let top = px(1.0 - margins.top, height);
    let bottom = px(margins.bottom, height);
    let (plots, legends) = root.split_horizontally(px(margins.right, FIGURE_WIDTH));
    let plots = plots.margin(top, bottom, px(margins.left, FIGURE_WIDTH), 0);
    let legends = legends.margin(top, bottom, 10, 0);

    let x_range = figure.x_range();
    let rows = plots.split_evenly((count, 1));
    let legend_rows = legends.split_evenly((count, 1));
    for ((panel, area), legend_area) in figure.panels.iter().zip(&rows).zip(&legend_rows) {
        draw_panel(panel, area, x_range)?;
        draw_legend(&panel.legend, legend_area)?;
    }

    root.present()
        .with_context(|| format!("Failed to write figure to {}", path.display()))?;
    info!("Figure written to {}", path.display());
    Ok(())
}

fn draw_panel(
    panel: &Panel,
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    (x_min, x_max): (f64, f64),
) -> Result<()> {
    let (y_min, y_max) = panel.y_range();

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, ("sans-serif", 18))
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    let mut mesh = chart.configure_mesh();
    mesh.x_desc("Time (s)");
    if let Some(desc) = &panel.y_desc {
        mesh.y_desc(desc);
    }
    mesh.draw()?;

    chart.draw_series(panel.tiles.iter().map(|t| {
        Rectangle::new([(t.x.0, t.y.0), (t.x.1, t.y.1)], colour(t.tint).filled())
    }))?;
    chart.draw_series(panel.tiles.iter().map(|t| {
        Rectangle::new([(t.x.0, t.y.0), (t.x.1, t.y.1)], BLACK.mix(0.4).stroke_width(1))
    }))?;

    for series in &panel.series {
        let colour = colour(series.tint);
        match series.style {
            DrawStyle::Scatter => {
                chart.draw_series(
                    series
                        .points
                        .iter()
                        .map(|&p| Circle::new(p, 3, colour.filled())),
                )?;
            }
            DrawStyle::Line | DrawStyle::StepPre | DrawStyle::StepPost => {
                chart.draw_series(LineSeries::new(
                    series.path(),
                    colour.stroke_width(series.stroke),
                ))?;
            }
        }
    }

    Ok(())
}

/// Legend entries stacked in the middle of the legend column
fn draw_legend(entries: &[LegendEntry], area: &DrawingArea<SVGBackend<'_>, Shift>) -> Result<()> {
    if entries.is_empty() {
        return Ok(());
    }

    let (_, height) = area.dim_in_pixel();
    let total = entries.len() as i32 * LEGEND_LINE_HEIGHT;
    let first = ((height as i32 - total) / 2).max(0);

    for (i, entry) in entries.iter().enumerate() {
        let y = first + i as i32 * LEGEND_LINE_HEIGHT + LEGEND_LINE_HEIGHT / 2;
        let colour = colour(entry.tint);
        match entry.marker {
            Marker::Line => {
                area.draw(&PathElement::new(vec![(0, y), (20, y)], colour.stroke_width(2)))?
            }
            Marker::Dot => area.draw(&Circle::new((10, y), 4, colour.filled()))?,
            Marker::Square => {
                area.draw(&Rectangle::new([(4, y - 6), (16, y + 6)], colour.filled()))?
            }
        }
        area.draw(&Text::new(
            entry.label.clone(),
            (26, y - 7),
            ("sans-serif", 14),
        ))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Margins;
    use crate::records::TimeWindow;
    use crate::render::{Series, Tile};
    use std::fs;

    fn figure() -> Figure {
        let mut power = Panel::default();
        power.set_title("Power (W)");
        power.add_series(
            Series::new(
                DrawStyle::StepPre,
                Tint::Instance(0),
                vec![(1.0, 10.0), (2.0, 15.0)],
            )
            .labelled("fcfs"),
        );

        let mut gantt = Panel::default();
        gantt.set_title("Gantt chart: fcfs");
        gantt.add_tile(Tile {
            x: (0.0, 2.0),
            y: (0.0, 4.0),
            tint: Tint::Job(0),
        });

        Figure {
            panels: vec![gantt, power],
            margins: Margins {
                right: 0.85,
                ..Margins::default()
            },
            window: TimeWindow::default(),
        }
    }

    #[test]
    fn writes_svg_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("figure.svg");
        write_svg(&figure(), &path).unwrap();

        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Gantt chart: fcfs"));
        assert!(svg.contains("Power (W)"));
        assert!(svg.contains("fcfs"));
    }

    #[test]
    fn other_extensions_still_get_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("figure.pdf");
        write_svg(&figure(), &path).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("<svg"));
    }

    #[test]
    fn margins_map_to_pixels() {
        assert_eq!(px(0.85, 1400), 1190);
        assert_eq!(px(1.5, 100), 100);
        assert_eq!(px(-0.1, 100), 0);
    }
}
