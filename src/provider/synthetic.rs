//! Scripted location source.
//!
//! Replays a fixed list of readings, each delivered a fixed delay after the previous one. The
//! replay cursor is shared by every subscription, so a paused-then-resumed run continues the
//! script instead of starting over.

use super::{epoch_ms, LocationError, LocationProvider, SampleSink, SubscriptionHandle};
use crate::model::{PositionSample, SamplingOptions};
use anyhow::{Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Meters per degree of latitude on a 6371 km sphere.
const METERS_PER_DEG_LAT: f64 = 111_194.93;

#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Sample(PositionSample),
    Fail(LocationError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedReading {
    /// Delay after the previous delivery (or after subscribing, for the first one).
    pub after: Duration,
    pub reading: Reading,
}

impl ScriptedReading {
    pub fn sample(after: Duration, sample: PositionSample) -> Self {
        Self {
            after,
            reading: Reading::Sample(sample),
        }
    }

    pub fn fail(after: Duration, err: LocationError) -> Self {
        Self {
            after,
            reading: Reading::Fail(err),
        }
    }
}

pub struct SyntheticProvider {
    script: Arc<Vec<ScriptedReading>>,
    cursor: Arc<AtomicUsize>,
    tasks: Mutex<HashMap<SubscriptionHandle, JoinHandle<()>>>,
}

impl SyntheticProvider {
    pub fn new(script: Vec<ScriptedReading>) -> Self {
        Self {
            script: Arc::new(script),
            cursor: Arc::new(AtomicUsize::new(0)),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    pub fn delivered(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    pub fn script_len(&self) -> usize {
        self.script.len()
    }
}

impl LocationProvider for SyntheticProvider {
    fn subscribe(
        &self,
        _options: &SamplingOptions,
        sink: SampleSink,
    ) -> Result<SubscriptionHandle, LocationError> {
        let rt = tokio::runtime::Handle::try_current().map_err(|_| {
            LocationError::position_unavailable("synthetic replay needs a Tokio runtime")
        })?;
        let handle = SubscriptionHandle::next();
        let script = self.script.clone();
        let cursor = self.cursor.clone();
        // Deadlines are anchored at subscribe time, not at the task's first poll.
        let mut next = Instant::now();

        let task = rt.spawn(async move {
            loop {
                let idx = cursor.load(Ordering::SeqCst);
                let Some(item) = script.get(idx) else {
                    debug!(delivered = idx, "synthetic script exhausted");
                    break;
                };
                next += item.after;
                tokio::time::sleep_until(next).await;
                if cursor
                    .compare_exchange(idx, idx + 1, Ordering::SeqCst, Ordering::SeqCst)
                    .is_err()
                {
                    continue;
                }
                match &item.reading {
                    Reading::Sample(s) => sink.deliver(Ok(s.clone())),
                    Reading::Fail(e) => {
                        sink.deliver(Err(e.clone()));
                        break;
                    }
                }
            }
        });

        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|_, t| !t.is_finished());
        tasks.insert(handle, task);
        Ok(handle)
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        let task = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle);
        if let Some(task) = task {
            task.abort();
        }
    }
}

impl Drop for SyntheticProvider {
    fn drop(&mut self) {
        let tasks = self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, task) in tasks.drain() {
            task.abort();
        }
    }
}

/// Parameters for a generated route: a wandering loop at roughly constant speed.
#[derive(Debug, Clone)]
pub struct SimulatedRoute {
    pub origin: (f64, f64),
    pub start_altitude: f64,
    pub speed_mps: f64,
    pub interval: Duration,
    pub points: usize,
    /// Average climb in percent of the horizontal distance.
    pub grade_percent: f64,
    pub seed: u64,
}

impl Default for SimulatedRoute {
    fn default() -> Self {
        Self {
            // Ibirapuera Park, São Paulo
            origin: (-23.5874, -46.6576),
            start_altitude: 760.0,
            speed_mps: 3.0,
            interval: Duration::from_secs(1),
            points: 3600,
            grade_percent: 1.0,
            seed: 0,
        }
    }
}

impl SimulatedRoute {
    pub fn samples(&self) -> Vec<PositionSample> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let (mut lat, mut lon) = self.origin;
        let mut alt = self.start_altitude;
        let mut heading: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
        let step_secs = self.interval.as_secs_f64();
        let step_ms = self.interval.as_millis() as i64;
        let base_ts = epoch_ms(OffsetDateTime::now_utc());

        let mut out = Vec::with_capacity(self.points);
        for i in 0..self.points {
            let mut speed = 0.0;
            if i > 0 {
                speed = (self.speed_mps * (1.0 + rng.gen_range(-0.1..0.1))).max(0.0);
                heading += rng.gen_range(-0.25..0.25);
                let d = speed * step_secs;
                lat += d * heading.cos() / METERS_PER_DEG_LAT;
                lon += d * heading.sin() / (METERS_PER_DEG_LAT * lat.to_radians().cos());
                alt += d * self.grade_percent / 100.0 + rng.gen_range(-0.5..0.5);
            }
            out.push(
                PositionSample::new(lat, lon, base_ts + step_ms * i as i64)
                    .with_altitude(alt)
                    .with_speed(speed),
            );
        }
        out
    }

    pub fn script(&self) -> Vec<ScriptedReading> {
        self.samples()
            .into_iter()
            .enumerate()
            .map(|(i, s)| {
                let after = if i == 0 { Duration::ZERO } else { self.interval };
                ScriptedReading::sample(after, s)
            })
            .collect()
    }
}

/// One entry of a track file: a recorded sample, or a scripted delivery error.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TrackEntry {
    Fail { after_ms: u64, error: LocationError },
    Sample(PositionSample),
}

/// Samples are spaced by the delta to the previous sample's timestamp. Failures fire `after_ms`
/// after the previous delivery.
fn track_script(entries: Vec<TrackEntry>) -> Vec<ScriptedReading> {
    let mut prev_ts: Option<i64> = None;
    entries
        .into_iter()
        .map(|entry| match entry {
            TrackEntry::Sample(s) => {
                let after = prev_ts
                    .map(|p| Duration::from_millis(s.timestamp.saturating_sub(p).max(0) as u64))
                    .unwrap_or(Duration::ZERO);
                prev_ts = Some(s.timestamp);
                ScriptedReading::sample(after, s)
            }
            TrackEntry::Fail { after_ms, error } => {
                ScriptedReading::fail(Duration::from_millis(after_ms), error)
            }
        })
        .collect()
}

/// Load a recorded track: a JSON array of position samples, optionally interleaved with
/// `{"after_ms": .., "error": {"code": .., "message": ..}}` failure entries.
pub fn load_track(path: &Path) -> Result<Vec<ScriptedReading>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read track file {}", path.display()))?;
    let entries: Vec<TrackEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("parse track file {}", path.display()))?;
    Ok(track_script(entries))
}
