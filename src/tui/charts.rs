use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use super::state::UiState;
use crate::metrics;

pub struct ChartRenderParams<'a> {
    pub area: Rect,
    pub datasets: Vec<Dataset<'a>>,
    pub x_axis: Axis<'a>,
    pub y_axis: Axis<'a>,
    pub title: Line<'a>,
    pub metrics: Option<(f64, f64, f64, f64)>,
    pub color: Color,
}

/// Metrics line (avg, med, p25, p75) shown under a chart.
fn render_metrics_text<'a>(metrics: (f64, f64, f64, f64), color: Color) -> Line<'a> {
    let (mean_val, median_val, p25_val, p75_val) = metrics;
    let mut spans = Vec::new();
    for (label, v) in [
        ("avg", mean_val),
        ("med", median_val),
        ("p25", p25_val),
        ("p75", p75_val),
    ] {
        if !spans.is_empty() {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(label, Style::default().fg(Color::Gray)));
        spans.push(Span::styled(format!(" {:.1}", v), Style::default().fg(color)));
    }
    Line::from(spans)
}

/// Render a line chart with metrics inside the same bordered box.
pub fn render_chart_with_metrics_inside(f: &mut Frame, params: ChartRenderParams) {
    let area = params.area;
    // Get inner area (accounting for borders)
    let inner = if area.width > 2 && area.height > 2 {
        Rect {
            x: area.x + 1,
            y: area.y + 1,
            width: area.width.saturating_sub(2),
            height: area.height.saturating_sub(2),
        }
    } else {
        area
    };

    let chart_metrics = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)].as_ref())
        .split(inner);

    let chart = Chart::new(params.datasets)
        .x_axis(params.x_axis)
        .y_axis(params.y_axis);
    f.render_widget(chart, chart_metrics[0]);

    if let Some(m) = params.metrics {
        f.render_widget(
            Paragraph::new(render_metrics_text(m, params.color)).alignment(Alignment::Center),
            chart_metrics[1],
        );
    }

    let block = Block::default().borders(Borders::ALL).title(params.title);
    f.render_widget(block, area);
}

pub fn max_y(points: &[(f64, f64)]) -> f64 {
    points.iter().map(|(_, y)| *y).fold(0.0, |a, b| a.max(b))
}

fn x_bounds(points: &[(f64, f64)]) -> [f64; 2] {
    let min = points.first().map(|(x, _)| *x).unwrap_or(0.0);
    let max = points.last().map(|(x, _)| *x).unwrap_or(0.0);
    [min, max.max(min + 1.0)]
}

/// Distance over time (left) and speed over time (right).
pub fn draw_progress_charts(area: Rect, f: &mut Frame, state: &UiState) {
    let row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(area);

    if state.distance_points.len() >= 2 {
        let y_max = (max_y(&state.distance_points) * 1.10).max(0.1);
        let ds = Dataset::default()
            .graph_type(GraphType::Line)
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(Color::Green))
            .data(&state.distance_points);
        render_chart_with_metrics_inside(
            f,
            ChartRenderParams {
                area: row[0],
                datasets: vec![ds],
                x_axis: Axis::default().title("s").bounds(x_bounds(&state.distance_points)),
                y_axis: Axis::default()
                    .title("km")
                    .bounds([0.0, y_max])
                    .labels(vec![Span::raw("0"), Span::raw(format!("{y_max:.2}"))]),
                title: Line::from(vec![
                    Span::raw("Distance ("),
                    Span::styled(
                        format!("{:.2} km", state.distance_km),
                        Style::default().fg(Color::Green),
                    ),
                    Span::raw(")"),
                ]),
                metrics: None,
                color: Color::Green,
            },
        );
    } else {
        let empty = Paragraph::new("Waiting for location readings...")
            .block(Block::default().borders(Borders::ALL).title("Distance"));
        f.render_widget(empty, row[0]);
    }

    if state.speed_points.len() >= 2 {
        let y_max = (max_y(&state.speed_points) * 1.10).max(1.0);
        let speeds: Vec<f64> = state.speed_points.iter().map(|(_, y)| *y).collect();
        let ds = Dataset::default()
            .graph_type(GraphType::Line)
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(Color::Cyan))
            .data(&state.speed_points);
        render_chart_with_metrics_inside(
            f,
            ChartRenderParams {
                area: row[1],
                datasets: vec![ds],
                x_axis: Axis::default().title("s").bounds(x_bounds(&state.speed_points)),
                y_axis: Axis::default()
                    .title("m/s")
                    .bounds([0.0, y_max])
                    .labels(vec![Span::raw("0"), Span::raw(format!("{y_max:.1}"))]),
                title: Line::from(vec![
                    Span::raw("Speed ("),
                    Span::styled(
                        format!("{:.1} m/s", state.current_speed_mps),
                        Style::default().fg(Color::Cyan),
                    ),
                    Span::raw(")"),
                ]),
                metrics: metrics::compute_metrics(&speeds),
                color: Color::Cyan,
            },
        );
    } else {
        let empty = Paragraph::new("Waiting for location readings...")
            .block(Block::default().borders(Borders::ALL).title("Speed"));
        f.render_widget(empty, row[1]);
    }
}
