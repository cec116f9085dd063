use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use time::OffsetDateTime;

/// A single geolocation reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSample {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
    /// Ground speed in m/s as reported by the receiver.
    #[serde(default)]
    pub speed: Option<f64>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

impl PositionSample {
    pub fn new(latitude: f64, longitude: f64, timestamp: i64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            speed: None,
            timestamp,
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Finished,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Idle => "idle",
            RunStatus::Running => "running",
            RunStatus::Paused => "paused",
            RunStatus::Finished => "finished",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunSource {
    App,
    Strava,
}

/// Finalized summary of a completed run. Handed to the caller on stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub distance_km: f64,
    pub duration_sec: u64,
    pub avg_pace_sec_per_km: f64,
    /// Local calendar day, `YYYY-MM-DD`.
    pub date: String,
    pub elevation_gain_m: u32,
    pub source: RunSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strava_id: Option<String>,
}

/// Read-only view of the live run, recomputed on every call.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerSnapshot {
    pub status: RunStatus,
    pub error: Option<String>,
    pub distance_km: f64,
    pub elapsed_ms: u64,
    /// Minutes per km, 0 when standing still.
    pub current_pace: f64,
    pub elevation_gain_m: f64,
    pub current_speed_mps: f64,
    pub sample_count: usize,
    /// Wall-clock instant of the initial start, unaffected by pauses.
    pub started_at: Option<OffsetDateTime>,
}

/// Options handed to the location provider on subscribe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingOptions {
    pub high_accuracy: bool,
    /// Longest wait for a single reading before the provider reports a timeout.
    #[serde(with = "humantime_serde")]
    pub max_wait: Duration,
    /// Oldest cached reading the provider may hand out; zero means live readings only.
    #[serde(with = "humantime_serde")]
    pub max_age: Duration,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            max_wait: Duration::from_secs(10),
            max_age: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,
    pub sampling: SamplingOptions,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            sampling: SamplingOptions::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum TrackerEvent {
    StatusChanged {
        status: RunStatus,
    },
    Sample {
        snapshot: TrackerSnapshot,
    },
    Tick {
        elapsed_ms: u64,
    },
    LocationError {
        message: String,
    },
    Info(InfoEvent),
    Finished {
        record: Box<RunRecord>,
    },
}

/// Structured info events emitted outside the tracker and consumed by UI/CLI layers.
#[derive(Debug, Clone)]
pub enum InfoEvent {
    Message(String),
    Rejected { op: &'static str, status: RunStatus },
}

impl InfoEvent {
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::Rejected { op, status } => format!("Cannot {op} while {status}"),
        }
    }
}
