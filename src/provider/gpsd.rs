//! Device location via a gpsd daemon.
//!
//! Speaks the gpsd JSON protocol over TCP: enable watch mode, then turn every TPV report that
//! carries a 2D/3D fix into a sample. gpsd only streams live reports, so every delivered sample is
//! fresh regardless of the requested cache age.

use super::{epoch_ms, LocationError, LocationProvider, SampleSink, SubscriptionHandle};
use crate::model::{PositionSample, SamplingOptions};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const DEFAULT_GPSD_ADDR: &str = "127.0.0.1:2947";
const WATCH_COMMAND: &[u8] = b"?WATCH={\"enable\":true,\"json\":true}\n";

#[derive(Debug, Deserialize)]
struct TpvReport {
    class: String,
    #[serde(default)]
    mode: u8,
    lat: Option<f64>,
    lon: Option<f64>,
    alt: Option<f64>,
    #[serde(rename = "altMSL")]
    alt_msl: Option<f64>,
    speed: Option<f64>,
    time: Option<String>,
}

pub struct GpsdProvider {
    addr: String,
    tasks: Mutex<HashMap<SubscriptionHandle, JoinHandle<()>>>,
}

impl GpsdProvider {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl Default for GpsdProvider {
    fn default() -> Self {
        Self::new(DEFAULT_GPSD_ADDR)
    }
}

impl LocationProvider for GpsdProvider {
    fn subscribe(
        &self,
        options: &SamplingOptions,
        sink: SampleSink,
    ) -> Result<SubscriptionHandle, LocationError> {
        let rt = tokio::runtime::Handle::try_current().map_err(|_| {
            LocationError::position_unavailable("gpsd watch needs a Tokio runtime")
        })?;
        let handle = SubscriptionHandle::next();
        let addr = self.addr.clone();
        let max_wait = options.max_wait;
        debug!(
            addr = %addr,
            high_accuracy = options.high_accuracy,
            max_age_ms = options.max_age.as_millis() as u64,
            "opening gpsd watch"
        );

        let task = rt.spawn(async move {
            if let Err(e) = watch(&addr, max_wait, &sink).await {
                warn!(addr = %addr, error = %e, "gpsd watch ended");
                sink.deliver(Err(e));
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
            debug!(addr = %self.addr, "closing gpsd watch");
            task.abort();
        }
    }
}

impl Drop for GpsdProvider {
    fn drop(&mut self) {
        let tasks = self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, task) in tasks.drain() {
            task.abort();
        }
    }
}

fn connect_error(addr: &str, e: &std::io::Error) -> LocationError {
    match e.kind() {
        std::io::ErrorKind::PermissionDenied => {
            LocationError::permission_denied(format!("not allowed to reach gpsd at {addr}: {e}"))
        }
        _ => LocationError::position_unavailable(format!("cannot reach gpsd at {addr}: {e}")),
    }
}

/// Stream fixes until the connection fails or a reading takes longer than `max_wait`.
async fn watch(addr: &str, max_wait: Duration, sink: &SampleSink) -> Result<(), LocationError> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| connect_error(addr, &e))?;
    let (reader, mut writer) = stream.into_split();
    writer.write_all(WATCH_COMMAND).await.map_err(|e| {
        LocationError::position_unavailable(format!("gpsd watch request failed: {e}"))
    })?;
    info!(addr, "gpsd watch enabled");

    let mut lines = BufReader::new(reader).lines();
    loop {
        let fix = match tokio::time::timeout(max_wait, next_fix(&mut lines)).await {
            Ok(res) => res?,
            Err(_) => {
                return Err(LocationError::timeout(format!(
                    "no fix from gpsd within {}",
                    humantime::format_duration(max_wait)
                )))
            }
        };
        sink.deliver(Ok(fix));
    }
}

async fn next_fix(
    lines: &mut Lines<BufReader<OwnedReadHalf>>,
) -> Result<PositionSample, LocationError> {
    loop {
        let line = lines
            .next_line()
            .await
            .map_err(|e| LocationError::position_unavailable(format!("gpsd read failed: {e}")))?
            .ok_or_else(|| LocationError::position_unavailable("gpsd closed the connection"))?;
        if let Some(sample) = parse_report(&line) {
            return Ok(sample);
        }
    }
}

/// Parse one gpsd report line. Anything but a TPV with a fix yields `None`.
fn parse_report(line: &str) -> Option<PositionSample> {
    let report: TpvReport = serde_json::from_str(line).ok()?;
    if report.class != "TPV" || report.mode < 2 {
        return None;
    }
    let (latitude, longitude) = (report.lat?, report.lon?);
    let at = report
        .time
        .as_deref()
        .and_then(|t| OffsetDateTime::parse(t, &Rfc3339).ok())
        .unwrap_or_else(OffsetDateTime::now_utc);
    Some(PositionSample {
        latitude,
        longitude,
        altitude: report.alt_msl.or(report.alt),
        speed: report.speed,
        timestamp: epoch_ms(at),
    })
}
