use crate::config::{self, ConfigOverrides};
use crate::format;
use crate::logging::{self, LogTarget};
use crate::model::{TrackerConfig, TrackerEvent, TrackerSnapshot};
use crate::orchestrator::{self, ControllerOptions, FinishedRun, UiCommand};
use crate::provider::{
    self, GpsdProvider, LocationProvider, SimulatedRoute, SyntheticProvider, UnavailableProvider,
};
use crate::tracker::RunTracker;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rand::RngCore;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

/// Where location readings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    /// A gpsd daemon
    Gpsd,
    /// A generated route
    Simulate,
    /// A recorded track file (see --replay)
    Replay,
    /// No location source; runs record time only
    None,
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "meta-humanos-run",
    version,
    about = "Live run tracker with distance, pace and climb, with optional TUI"
)]
pub struct Cli {
    /// Print the run record as JSON and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print live progress and a text summary (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Location source
    #[arg(long, value_enum, default_value_t = ProviderKind::Simulate)]
    pub provider: ProviderKind,

    /// gpsd address for --provider gpsd
    #[arg(long, default_value = provider::DEFAULT_GPSD_ADDR)]
    pub gpsd_addr: String,

    /// Recorded track to replay: a JSON array of position samples and optional
    /// `{"after_ms", "error"}` failure entries
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Simulated running speed in m/s
    #[arg(long, default_value_t = 3.0)]
    pub sim_speed: f64,

    /// Time between simulated readings
    #[arg(long, default_value = "1s")]
    pub sim_interval: humantime::Duration,

    /// Number of simulated readings
    #[arg(long, default_value_t = 3600)]
    pub sim_points: usize,

    /// Average simulated climb, percent of distance
    #[arg(long, default_value_t = 1.0)]
    pub sim_grade: f64,

    /// Seed for the simulated route (random if omitted)
    #[arg(long)]
    pub sim_seed: Option<u64>,

    /// Tracker config file (JSON). Defaults to <config dir>/meta-humanos/tracker.json if present
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Interval of elapsed-time updates
    #[arg(long)]
    pub tick_interval: Option<humantime::Duration>,

    /// Longest wait for a location reading before reporting a timeout
    #[arg(long)]
    pub max_wait: Option<humantime::Duration>,

    /// Oldest cached location reading accepted
    #[arg(long)]
    pub max_age: Option<humantime::Duration>,

    /// Ask the location source for coarse readings
    #[arg(long)]
    pub low_accuracy: bool,

    /// Stop the run after this much active time (text/JSON modes stop on Ctrl-C otherwise)
    #[arg(long)]
    pub duration: Option<humantime::Duration>,

    /// Export the finished run record as JSON
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Write logs to this file (the TUI logs nowhere else)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Start a run as soon as the TUI opens
    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    pub start_on_launch: bool,
}

fn uses_tui(args: &Cli) -> bool {
    cfg!(feature = "tui") && !args.json && !args.text
}

pub async fn run(args: Cli) -> Result<()> {
    if args.json && args.text {
        return Err(anyhow::anyhow!("--json and --text are mutually exclusive"));
    }

    let target = match (&args.log_file, uses_tui(&args)) {
        (Some(path), _) => LogTarget::File(path.clone()),
        (None, true) => LogTarget::Off,
        (None, false) => LogTarget::Stderr,
    };
    logging::init(&args.log_level, target)?;

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_text(args).await;
        }
    }

    if args.json {
        return run_json(args).await;
    }

    run_text(args).await
}

/// Build the tracker config: config file first, then command-line overrides.
pub fn build_config(args: &Cli) -> Result<TrackerConfig> {
    let file_cfg = config::load_config(args.config.as_deref())?;
    let overrides = ConfigOverrides {
        tick_interval: args.tick_interval.map(Duration::from),
        max_wait: args.max_wait.map(Duration::from),
        max_age: args.max_age.map(Duration::from),
        high_accuracy: args.low_accuracy.then_some(false),
    };
    Ok(overrides.apply(file_cfg))
}

/// Build the location source selected on the command line.
pub fn build_provider(args: &Cli) -> Result<Arc<dyn LocationProvider>> {
    let kind = match (args.provider, &args.replay) {
        (ProviderKind::Simulate, Some(_)) => ProviderKind::Replay,
        (kind, _) => kind,
    };
    let provider: Arc<dyn LocationProvider> = match kind {
        ProviderKind::Gpsd => {
            let gpsd = GpsdProvider::new(args.gpsd_addr.clone());
            info!(addr = gpsd.addr(), "using gpsd");
            Arc::new(gpsd)
        }
        ProviderKind::Simulate => {
            let route = SimulatedRoute {
                speed_mps: args.sim_speed,
                interval: Duration::from(args.sim_interval),
                points: args.sim_points,
                grade_percent: args.sim_grade,
                seed: args.sim_seed.unwrap_or_else(|| rand::thread_rng().next_u64()),
                ..Default::default()
            };
            info!(seed = route.seed, points = route.points, "using simulated route");
            Arc::new(SyntheticProvider::new(route.script()))
        }
        ProviderKind::Replay => {
            let path = args
                .replay
                .as_deref()
                .context("--provider replay needs --replay <track.json>")?;
            let replay = SyntheticProvider::new(provider::load_track(path)?);
            info!(path = %path.display(), readings = replay.script_len(), "replaying track");
            Arc::new(replay)
        }
        ProviderKind::None => Arc::new(UnavailableProvider),
    };
    Ok(provider)
}

/// Ask the controller to quit (finishing any open run) on Ctrl-C.
fn spawn_interrupt_handler(cmd_tx: mpsc::UnboundedSender<UiCommand>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, finishing run");
            let _ = cmd_tx.send(UiCommand::Quit);
        }
    });
}

fn live_line(elapsed_ms: u64, last: Option<&TrackerSnapshot>) -> String {
    let (km, pace, climb) = last
        .map(|s| (s.distance_km, s.current_pace, s.elevation_gain_m))
        .unwrap_or_default();
    format!(
        "{}  {}  pace {} /km  climb {:.0} m",
        format::format_duration_ms(elapsed_ms),
        format::format_distance_km(km),
        format::format_pace_min_per_km(pace),
        climb
    )
}

/// Run one headless session. `live` receives every tracker event while the run is open.
async fn run_headless(
    args: &Cli,
    mut live: impl FnMut(TrackerEvent),
) -> Result<Option<FinishedRun>> {
    let tracker_cfg = build_config(args)?;
    let provider = build_provider(args)?;
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<TrackerEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    spawn_interrupt_handler(cmd_tx.clone());

    let tracker = RunTracker::new(provider, tracker_cfg).with_events(evt_tx.clone());
    let opts = ControllerOptions {
        auto_start: true,
        stop_after: args.duration.map(Duration::from),
        quit_on_finish: true,
    };
    let mut controller = tokio::spawn(orchestrator::run_controller(tracker, opts, evt_tx, cmd_rx));

    let finished = loop {
        tokio::select! {
            Some(ev) = evt_rx.recv() => live(ev),
            res = &mut controller => break res.context("run controller task failed")?,
        }
    };
    while let Ok(ev) = evt_rx.try_recv() {
        live(ev);
    }
    drop(cmd_tx);
    Ok(finished)
}

async fn run_json(args: Cli) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();
    let err_tx = out_tx.clone();
    let finished = run_headless(&args, move |ev| match ev {
        TrackerEvent::LocationError { message } => {
            let _ = err_tx.send(OutputLine::Stderr(format!("Location error: {message}")));
        }
        TrackerEvent::Info(info) => {
            let _ = err_tx.send(OutputLine::Stderr(info.to_message()));
        }
        _ => {}
    })
    .await?
    .context("run ended without a record")?;

    if let Some(p) = args.export_json.as_deref() {
        orchestrator::export_json(p, &finished.record)?;
    }
    let out = serde_json::to_string_pretty(&finished.record)?;
    let _ = out_tx.send(OutputLine::Stdout(out));

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

async fn run_text(args: Cli) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();
    let live_tx = out_tx.clone();
    let mut last: Option<TrackerSnapshot> = None;

    let finished = run_headless(&args, move |ev| {
        let line = match ev {
            TrackerEvent::StatusChanged { status } => Some(format!("== {status} ==")),
            TrackerEvent::Sample { snapshot } => {
                last = Some(snapshot);
                None
            }
            TrackerEvent::Tick { elapsed_ms } => Some(live_line(elapsed_ms, last.as_ref())),
            TrackerEvent::LocationError { message } => Some(format!("Location error: {message}")),
            TrackerEvent::Info(info) => Some(info.to_message()),
            TrackerEvent::Finished { .. } => None,
        };
        if let Some(line) = line {
            let _ = live_tx.send(OutputLine::Stderr(line));
        }
    })
    .await?
    .context("run ended without a record")?;

    let processed = orchestrator::process_run_completion(args.export_json.as_deref(), &finished);
    for line in processed.summary.lines {
        let _ = out_tx.send(OutputLine::Stdout(line));
    }
    for msg in &processed.export_messages {
        let _ = out_tx.send(OutputLine::Stderr(msg.clone()));
    }
    drop(out_tx);
    let _ = out_handle.await;

    if args.export_json.is_some() && processed.exported_path.is_none() {
        return Err(anyhow::anyhow!("export failed"));
    }
    Ok(())
}
