//! Interactive terminal viewer using ratatui.
//!
//! Used when no output file is given. Panels are shown a few at a time and
//! can be scrolled; series are drawn as braille charts and Gantt tiles on a
//! canvas.

use crate::histogram::Histogram;
use crate::records::PstateRole;
use crate::render::{
    DrawStyle, Figure, LegendEntry, Marker as LegendMarker, Panel, Series, Tile, Tint,
};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    prelude::CrosstermBackend,
    style::{Color, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Line as CanvasLine},
        Axis, BarChart, Block, Borders, Chart, Dataset, GraphType, Paragraph,
    },
    Frame, Terminal,
};
use std::io;
use std::ops::Range;
use std::time::Duration;

const PANELS_PER_PAGE: usize = 3;

const PALETTE: [Color; 8] = [
    Color::Cyan,
    Color::Green,
    Color::Yellow,
    Color::Magenta,
    Color::Blue,
    Color::LightRed,
    Color::LightGreen,
    Color::LightBlue,
];

fn tint_color(tint: Tint) -> Color {
    match tint {
        Tint::Instance(i) | Tint::Job(i) => PALETTE[i % PALETTE.len()],
        Tint::Reference => Color::Red,
        Tint::Role(PstateRole::Off) => Color::DarkGray,
        Tint::Role(PstateRole::SwitchingOn) => Color::LightYellow,
        Tint::Role(PstateRole::SwitchingOff) => Color::LightMagenta,
    }
}

/// Panels shown when the first visible one is `offset`
fn visible_range(offset: usize, count: usize) -> Range<usize> {
    let start = offset.min(count.saturating_sub(PANELS_PER_PAGE));
    start..(start + PANELS_PER_PAGE).min(count)
}

/// Show a figure until the user quits
pub fn show_figure(figure: &Figure) -> Result<()> {
    let count = figure.panels.len();
    run_terminal(count, |f, visible| draw_figure(f, figure, visible))
}

/// Show a histogram until the user quits
pub fn show_histogram(histogram: &Histogram) -> Result<()> {
    run_terminal(1, |f, _| {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(1)])
            .split(f.area());
        render_histogram(f, chunks[0], histogram);
        render_help_bar(f, chunks[1], 0..1, 1);
    })
}

/// Set up the terminal, run the event loop and restore the terminal even
/// when drawing fails.
fn run_terminal<F>(count: usize, draw: F) -> Result<()>
where
    F: FnMut(&mut Frame, Range<usize>),
{
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, count, draw);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn event_loop<B, F>(terminal: &mut Terminal<B>, count: usize, mut draw: F) -> Result<()>
where
    B: ratatui::backend::Backend,
    F: FnMut(&mut Frame, Range<usize>),
{
    let mut offset = 0;
    loop {
        let visible = visible_range(offset, count);
        terminal.draw(|f| draw(f, visible.clone()))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Down | KeyCode::Char('j') => {
                            offset = visible_range(offset + 1, count).start;
                        }
                        KeyCode::Up | KeyCode::Char('k') => offset = visible.start.saturating_sub(1),
                        _ => {}
                    }
                }
            }
        }
    }
    Ok(())
}

fn draw_figure(f: &mut Frame, figure: &Figure, visible: Range<usize>) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(1)])
        .split(f.area());

    let shown = visible.len().max(1) as u32;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, shown); shown as usize])
        .split(main_chunks[0]);

    let x_range = figure.x_range();
    for (panel, row) in figure.panels[visible.clone()].iter().zip(rows.iter()) {
        let legend_cols = legend_width(&panel.legend, figure.margins.right, row.width);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(10), Constraint::Length(legend_cols)])
            .split(*row);
        render_panel(f, columns[0], panel, x_range);
        render_legend(f, columns[1], &panel.legend);
    }

    render_help_bar(f, main_chunks[1], visible, figure.panels.len());
}

fn render_panel(f: &mut Frame, area: Rect, panel: &Panel, (x_min, x_max): (f64, f64)) {
    let block = Block::default()
        .title(format!(" {} ", panel.title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let (y_min, y_max) = panel.y_range();

    if !panel.tiles.is_empty() {
        // One braille row is a quarter of a terminal row
        let dot_rows = f64::from(area.height.saturating_sub(2).max(1)) * 4.0;
        let step = (y_max - y_min) / dot_rows;
        let canvas = Canvas::default()
            .block(block)
            .marker(Marker::Braille)
            .x_bounds([x_min, x_max])
            .y_bounds([y_min, y_max])
            .paint(|ctx| {
                for tile in &panel.tiles {
                    for line in fill_lines(tile, step) {
                        ctx.draw(&line);
                    }
                }
            });
        f.render_widget(canvas, area);
        return;
    }

    // Datasets borrow their points, so paths are built first
    let paths: Vec<Vec<(f64, f64)>> = panel.series.iter().map(Series::path).collect();
    let datasets: Vec<Dataset> = panel
        .series
        .iter()
        .zip(&paths)
        .map(|(series, path)| {
            let graph_type = match series.style {
                DrawStyle::Scatter => GraphType::Scatter,
                _ => GraphType::Line,
            };
            Dataset::default()
                .marker(Marker::Braille)
                .graph_type(graph_type)
                .style(Style::default().fg(tint_color(series.tint)))
                .data(path)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title("Time (s)")
                .style(Style::default().fg(Color::Gray))
                .bounds([x_min, x_max])
                .labels(axis_labels(x_min, x_max)),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .bounds([y_min, y_max])
                .labels(axis_labels(y_min, y_max)),
        );
    f.render_widget(chart, area);
}

/// Horizontal lines filling a tile, `step` apart and never fewer than one
fn fill_lines(tile: &Tile, step: f64) -> Vec<CanvasLine> {
    let (x1, x2) = tile.x;
    let (bottom, top) = tile.y;
    let color = tint_color(tile.tint);
    let line = |y| CanvasLine::new(x1, y, x2, y, color);

    if step.is_nan() || step <= 0.0 || top - bottom <= step {
        return vec![line((bottom + top) / 2.0)];
    }
    let mut lines = Vec::new();
    let mut y = bottom + step / 2.0;
    while y < top {
        lines.push(line(y));
        y += step;
    }
    lines
}

fn axis_labels(min: f64, max: f64) -> Vec<String> {
    let mid = (min + max) / 2.0;
    [min, mid, max].iter().map(|v| format!("{:.1}", v)).collect()
}

/// Columns kept for the legend: at least what the right margin leaves, and
/// enough for the longest label, but never more than half the row.
fn legend_width(entries: &[LegendEntry], right: f64, row_width: u16) -> u16 {
    if entries.is_empty() {
        return 0;
    }
    let longest = entries
        .iter()
        .map(|e| e.label.chars().count())
        .max()
        .unwrap_or(0) as u16;
    let from_margin = ((1.0 - right.clamp(0.0, 1.0)) * f64::from(row_width)).round() as u16;
    (longest + 4).max(from_margin).min(row_width / 2)
}

fn legend_lines(entries: &[LegendEntry]) -> Vec<Line<'_>> {
    entries
        .iter()
        .map(|entry| {
            let symbol = match entry.marker {
                LegendMarker::Line => "── ",
                LegendMarker::Dot => "●  ",
                LegendMarker::Square => "■  ",
            };
            Line::from(vec![
                Span::styled(symbol, Style::default().fg(tint_color(entry.tint))),
                Span::raw(entry.label.as_str()),
            ])
        })
        .collect()
}

fn render_legend(f: &mut Frame, area: Rect, entries: &[LegendEntry]) {
    if entries.is_empty() || area.width == 0 {
        return;
    }
    // Center the entries vertically next to their panel
    let height = (entries.len() as u16).min(area.height);
    let top = area.y + (area.height - height) / 2;
    let area = Rect::new(area.x + 1, top, area.width.saturating_sub(1), height);
    f.render_widget(Paragraph::new(legend_lines(entries)), area);
}

fn render_histogram(f: &mut Frame, area: Rect, histogram: &Histogram) {
    let block = Block::default()
        .title(format!(" {} ", crate::histogram::TITLE))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let labels: Vec<String> = histogram
        .edges
        .windows(2)
        .map(|edge| format!("{:.1}", edge[0]))
        .collect();
    let bars: Vec<(&str, u64)> = labels
        .iter()
        .map(String::as_str)
        .zip(histogram.counts.iter().copied())
        .collect();

    let bin_count = bars.len().max(1) as u16;
    let bar_width = (area.width.saturating_sub(2) / bin_count).saturating_sub(1).max(1);

    let chart = BarChart::default()
        .block(block)
        .data(bars.as_slice())
        .bar_width(bar_width)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    f.render_widget(chart, area);
}

fn render_help_bar(f: &mut Frame, area: Rect, visible: Range<usize>, count: usize) {
    let text = if count > PANELS_PER_PAGE {
        format!(
            " q: Quit | ↑/↓: Scroll (panels {}-{} of {}) ",
            visible.start + 1,
            visible.end,
            count
        )
    } else {
        " q: Quit ".to_string()
    };
    let paragraph = Paragraph::new(text).style(Style::default().fg(Color::Black).bg(Color::Gray));
    f.render_widget(paragraph, area);
}
