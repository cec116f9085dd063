mod charts;
mod help;
mod state;

use crate::cli::{build_config, build_provider, Cli};
use crate::format;
use crate::model::{RunRecord, RunStatus, TrackerEvent};
use crate::orchestrator::{self, ControllerOptions, FinishedRun, UiCommand};
use crate::tracker::RunTracker;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Sparkline, Tabs},
    Terminal,
};
use state::UiState;
use std::path::Path;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    let tracker_cfg = build_config(&args)?;
    let provider = build_provider(&args)?;

    // Unbounded channels avoid backpressure and task switching in the hot path.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<TrackerEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_args = args.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_args, event_rx, cmd_tx));

    let tracker = RunTracker::new(provider, tracker_cfg).with_events(event_tx.clone());
    let opts = ControllerOptions {
        auto_start: args.start_on_launch,
        stop_after: args.duration.map(Duration::from),
        quit_on_finish: false,
    };
    let finished = orchestrator::run_controller(tracker, opts, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    export_on_exit(finished.as_ref(), args.export_json.as_deref())?;
    Ok(())
}

/// Export a run that quitting stopped. The UI thread is gone by then, so it never saw the
/// record; runs finished earlier were exported as they completed.
fn export_on_exit(finished: Option<&FinishedRun>, path: Option<&Path>) -> Result<bool> {
    match (finished, path) {
        (Some(run), Some(path)) if run.stopped_on_quit => {
            orchestrator::export_json(path, &run.record)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

fn source_label(args: &Cli) -> String {
    if let Some(p) = args.replay.as_deref() {
        return format!("replay {}", p.display());
    }
    match args.provider {
        crate::cli::ProviderKind::Gpsd => format!("gpsd {}", args.gpsd_addr),
        crate::cli::ProviderKind::Simulate => format!("simulated {:.1} m/s", args.sim_speed),
        crate::cli::ProviderKind::Replay => "replay".into(),
        crate::cli::ProviderKind::None => "none".into(),
    }
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    args: Cli,
    mut event_rx: UnboundedReceiver<TrackerEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState {
        source: source_label(&args),
        info: "Press s to start".into(),
        ..Default::default()
    };

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            match ev {
                TrackerEvent::Finished { record } => {
                    handle_run_completed(&args, &mut state, *record);
                }
                other => state.apply_event(other),
            }
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match (k.modifiers, k.code) {
                    (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (_, KeyCode::Char('s')) => {
                        let _ = cmd_tx.send(UiCommand::Start);
                    }
                    (_, KeyCode::Char('p')) => {
                        let _ = cmd_tx.send(UiCommand::TogglePause);
                    }
                    (_, KeyCode::Char('x')) => {
                        let _ = cmd_tx.send(UiCommand::Stop);
                    }
                    (_, KeyCode::Char('r')) => {
                        state.info = "Reset requested…".into();
                        let _ = cmd_tx.send(UiCommand::Reset);
                    }
                    (_, KeyCode::Tab) => {
                        state.tab = (state.tab + 1) % 2;
                    }
                    (_, KeyCode::Char('?')) => {
                        state.tab = 1;
                    }
                    _ => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn handle_run_completed(args: &Cli, state: &mut UiState, record: RunRecord) {
    if let Some(path) = args.export_json.as_deref() {
        match orchestrator::export_json(path, &record) {
            Ok(()) => {
                state.last_exported_path = Some(path.display().to_string());
                state.info = "Run finished and exported. Press r to reset.".into();
            }
            Err(e) => state.info = format!("Export JSON failed: {e:#}"),
        }
    } else {
        state.info = "Run finished. Press r to reset.".into();
    }
    state.apply_event(TrackerEvent::Finished {
        record: Box::new(record),
    });
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![Line::from("Run"), Line::from("Help")])
        .select(state.tab)
        .block(Block::default().borders(Borders::ALL).title("meta-humanos-run"))
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        0 => draw_dashboard(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f),
    }
}

fn card<'a>(title: &'a str, value: String, color: Color) -> Paragraph<'a> {
    Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(value, Style::default().fg(color))),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).title(title))
}

fn draw_dashboard(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(4), // metric cards
                Constraint::Min(8),    // distance + speed charts
                Constraint::Length(4), // speed sparkline
                Constraint::Length(8), // status
            ]
            .as_ref(),
        )
        .split(area);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25); 4].as_ref())
        .split(main[0]);
    f.render_widget(
        card("Distance", format::format_distance_km(state.distance_km), Color::Green),
        cards[0],
    );
    f.render_widget(
        card("Time", format::format_duration_ms(state.elapsed_ms), Color::White),
        cards[1],
    );
    f.render_widget(
        card(
            "Pace",
            format!("{} /km", format::format_pace_min_per_km(state.current_pace)),
            Color::Cyan,
        ),
        cards[2],
    );
    f.render_widget(
        card("Climb", format!("{:.0} m", state.elevation_gain_m), Color::Magenta),
        cards[3],
    );

    charts::draw_progress_charts(main[1], f, state);

    let spark = Sparkline::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Speed (recent readings)"),
        )
        .data(&state.speed_series)
        .style(Style::default().fg(Color::Cyan));
    f.render_widget(spark, main[2]);

    let mut lines = vec![state.status_line()];
    if let Some(err) = state.error.as_deref() {
        lines.push(Line::from(vec![
            Span::styled("Location:", Style::default().fg(Color::Gray)),
            Span::raw(" "),
            Span::styled(err.to_string(), Style::default().fg(Color::Red)),
        ]));
    }
    if let Some(r) = state.last_record.as_ref() {
        lines.push(Line::from(format!(
            "Last run {}: {} in {}, avg {} /km, climb {} m",
            r.date,
            format::format_distance_km(r.distance_km),
            format::format_duration_secs(r.duration_sec),
            format::format_pace_sec_per_km(r.avg_pace_sec_per_km),
            r.elevation_gain_m
        )));
    }
    if let Some(path) = state.last_exported_path.as_deref() {
        lines.push(Line::from(vec![
            Span::styled("Saved:", Style::default().fg(Color::Gray)),
            Span::raw(" "),
            Span::styled(path.to_string(), Style::default().fg(Color::Green)),
        ]));
    }
    lines.push(Line::from(state.info.clone()));
    let hint = match state.status {
        RunStatus::Idle => "s start  tab help  q quit",
        RunStatus::Running => "p pause  x stop  r reset  q quit",
        RunStatus::Paused => "p resume  x stop  r reset  q quit",
        RunStatus::Finished => "r reset  q quit",
    };
    lines.push(Line::from(Span::styled(hint, Style::default().fg(Color::Gray))));

    let status = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, main[3]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RunRecord, RunSource};

    fn finished(stopped_on_quit: bool) -> FinishedRun {
        FinishedRun {
            record: RunRecord {
                distance_km: 1.5,
                duration_sec: 540,
                avg_pace_sec_per_km: 360.0,
                date: "2026-10-16".into(),
                elevation_gain_m: 4,
                source: RunSource::App,
                strava_id: None,
            },
            samples: Vec::new(),
            stopped_on_quit,
        }
    }

    #[test]
    fn exit_exports_only_runs_stopped_by_quitting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");

        assert!(!export_on_exit(Some(&finished(false)), Some(&path)).unwrap());
        assert!(!path.exists());
        assert!(!export_on_exit(None, Some(&path)).unwrap());
        assert!(!export_on_exit(Some(&finished(true)), None).unwrap());

        assert!(export_on_exit(Some(&finished(true)), Some(&path)).unwrap());
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["durationSec"], 540);
    }
}
