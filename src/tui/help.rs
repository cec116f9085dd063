use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

fn key_line(key: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(what),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("q", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("  Quit (an open run is stopped first)"),
        ]),
        key_line("s", 11, "Start a run"),
        key_line("p", 11, "Pause/Resume"),
        key_line("x", 11, "Stop and save the run record"),
        key_line("r", 11, "Reset to idle"),
        key_line("tab", 9, "Switch tabs"),
        key_line("?", 11, "Show this help"),
        Line::from(""),
        Line::from("Metrics:"),
        Line::from("  Distance sums great-circle steps between readings."),
        Line::from("  Climb counts rises only; descents are ignored."),
        Line::from("  Pace is shown only above 0.3 m/s (GPS jitter floor)."),
        Line::from("  Paused time is excluded from the run time."),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
