use crate::model::{RunRecord, RunStatus, TrackerEvent};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

/// UI-side view of the run. Owned by the UI thread only.
#[derive(Debug, Default)]
pub struct UiState {
    pub tab: usize,
    pub status: RunStatus,
    pub info: String,
    pub error: Option<String>,
    pub source: String,

    pub elapsed_ms: u64,
    pub distance_km: f64,
    pub current_pace: f64,
    pub elevation_gain_m: f64,
    pub current_speed_mps: f64,
    pub sample_count: usize,

    /// Speed in cm/s, for the sparkline.
    pub speed_series: Vec<u64>,
    // (seconds of active time, value)
    pub speed_points: Vec<(f64, f64)>,
    pub distance_points: Vec<(f64, f64)>,

    pub last_record: Option<RunRecord>,
    pub last_exported_path: Option<String>,
}

impl UiState {
    fn push_series(series: &mut Vec<u64>, v: u64) {
        const MAX: usize = 120;
        series.push(v);
        if series.len() > MAX {
            let _ = series.drain(0..(series.len() - MAX));
        }
    }

    fn push_point(points: &mut Vec<(f64, f64)>, x: f64, y: f64) {
        const MAX: usize = 3600; // an hour at 1 Hz
        points.push((x, y));
        if points.len() > MAX {
            let _ = points.drain(0..(points.len() - MAX));
        }
    }

    fn clear_run(&mut self) {
        self.error = None;
        self.elapsed_ms = 0;
        self.distance_km = 0.0;
        self.current_pace = 0.0;
        self.elevation_gain_m = 0.0;
        self.current_speed_mps = 0.0;
        self.sample_count = 0;
        self.speed_series.clear();
        self.speed_points.clear();
        self.distance_points.clear();
    }

    pub fn apply_event(&mut self, ev: TrackerEvent) {
        match ev {
            TrackerEvent::StatusChanged { status } => {
                match (self.status, status) {
                    (RunStatus::Idle, RunStatus::Running) => {
                        self.clear_run();
                        self.last_record = None;
                    }
                    (_, RunStatus::Idle) => {
                        self.clear_run();
                        self.last_record = None;
                        self.last_exported_path = None;
                    }
                    _ => {}
                }
                self.status = status;
                self.info = format!("Run {status}");
            }
            TrackerEvent::Sample { snapshot } => {
                let t = snapshot.elapsed_ms as f64 / 1000.0;
                Self::push_series(
                    &mut self.speed_series,
                    (snapshot.current_speed_mps * 100.0).round() as u64,
                );
                Self::push_point(&mut self.speed_points, t, snapshot.current_speed_mps);
                Self::push_point(&mut self.distance_points, t, snapshot.distance_km);

                self.elapsed_ms = snapshot.elapsed_ms;
                self.distance_km = snapshot.distance_km;
                self.current_pace = snapshot.current_pace;
                self.elevation_gain_m = snapshot.elevation_gain_m;
                self.current_speed_mps = snapshot.current_speed_mps;
                self.sample_count = snapshot.sample_count;
                self.error = snapshot.error;
            }
            TrackerEvent::Tick { elapsed_ms } => {
                self.elapsed_ms = elapsed_ms;
            }
            TrackerEvent::LocationError { message } => {
                self.info = "Location unavailable; time is still recorded".into();
                self.error = Some(message);
            }
            TrackerEvent::Info(info) => {
                self.info = info.to_message();
            }
            TrackerEvent::Finished { record } => {
                self.elapsed_ms = record.duration_sec * 1000;
                self.last_record = Some(*record);
            }
        }
    }

    pub fn status_line(&self) -> Line<'static> {
        let color = match self.status {
            RunStatus::Idle => Color::Gray,
            RunStatus::Running => Color::Green,
            RunStatus::Paused => Color::Yellow,
            RunStatus::Finished => Color::Cyan,
        };
        Line::from(vec![
            Span::styled("Status:", Style::default().fg(Color::Gray)),
            Span::raw(" "),
            Span::styled(self.status.to_string().to_uppercase(), Style::default().fg(color)),
            Span::raw("  "),
            Span::styled("Source:", Style::default().fg(Color::Gray)),
            Span::raw(" "),
            Span::raw(self.source.clone()),
            Span::raw("  "),
            Span::styled("Readings:", Style::default().fg(Color::Gray)),
            Span::raw(format!(" {}", self.sample_count)),
        ])
    }
}
