//! Live run tracking.
//!
//! [`RunTracker`] owns the run lifecycle (idle, running, paused, finished), keeps a location
//! subscription open while running and folds every reading into distance, climb and pace. Callers
//! either poll [`RunTracker::snapshot`] or listen on the event channel passed to
//! [`RunTracker::with_events`].

pub(crate) mod geo;
mod state;

use crate::metrics;
use crate::model::{
    PositionSample, RunRecord, RunSource, RunStatus, TrackerConfig, TrackerEvent, TrackerSnapshot,
};
use crate::provider::{LocationProvider, SampleSink, SubscriptionHandle};
use state::RunState;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

pub const UNSUPPORTED_MESSAGE: &str = "Geolocation is not supported on this platform.";

const MIN_TICK: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Start,
    Pause,
    Resume,
    Stop,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Start => "start",
            Operation::Pause => "pause",
            Operation::Resume => "resume",
            Operation::Stop => "stop",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("cannot {op} a run that is {from}")]
    InvalidTransition { op: Operation, from: RunStatus },
}

fn lock(shared: &Mutex<RunState>) -> MutexGuard<'_, RunState> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

fn emit(events: &Option<UnboundedSender<TrackerEvent>>, ev: TrackerEvent) {
    if let Some(tx) = events {
        let _ = tx.send(ev);
    }
}

fn ensure(st: &RunState, op: Operation, allowed: &[RunStatus]) -> Result<(), TrackerError> {
    if allowed.contains(&st.status) {
        Ok(())
    } else {
        warn!(op = %op, status = %st.status, "rejected lifecycle call");
        Err(TrackerError::InvalidTransition {
            op,
            from: st.status,
        })
    }
}

/// Stop accepting readings. The returned handle still has to be unsubscribed, outside the lock.
fn detach_sampling(st: &mut RunState) -> Option<SubscriptionHandle> {
    st.sampling = None;
    st.subscription.take()
}

fn local_date() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let format = time::macros::format_description!("[year]-[month]-[day]");
    now.format(&format)
        .unwrap_or_else(|_| now.date().to_string())
}

fn finalize(st: &RunState) -> RunRecord {
    let duration_secs = st.banked.as_millis() as f64 / 1000.0;
    RunRecord {
        distance_km: metrics::round_to(st.distance_km, 2),
        duration_sec: duration_secs.round() as u64,
        avg_pace_sec_per_km: metrics::avg_pace_sec_per_km(duration_secs, st.distance_km),
        date: local_date(),
        elevation_gain_m: st.elevation_gain_m.round() as u32,
        source: RunSource::App,
        strava_id: None,
    }
}

pub struct RunTracker {
    provider: Arc<dyn LocationProvider>,
    config: TrackerConfig,
    shared: Arc<Mutex<RunState>>,
    events: Option<UnboundedSender<TrackerEvent>>,
    ticker: Option<JoinHandle<()>>,
    generation: u64,
}

impl RunTracker {
    pub fn new(provider: Arc<dyn LocationProvider>, config: TrackerConfig) -> Self {
        Self {
            provider,
            config,
            shared: Arc::new(Mutex::new(RunState::default())),
            events: None,
            ticker: None,
            generation: 0,
        }
    }

    /// Publish a [`TrackerEvent`] after every state change.
    pub fn with_events(mut self, events: UnboundedSender<TrackerEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn status(&self) -> RunStatus {
        lock(&self.shared).status
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        lock(&self.shared).snapshot(Instant::now())
    }

    /// Readings of the current run, in arrival order.
    pub fn samples(&self) -> Vec<PositionSample> {
        lock(&self.shared).samples.clone()
    }

    pub fn start(&mut self) -> Result<(), TrackerError> {
        {
            let mut st = lock(&self.shared);
            ensure(&st, Operation::Start, &[RunStatus::Idle])?;
            st.clear_run();
            st.started_at = Some(OffsetDateTime::now_utc());
            st.segment_start = Some(Instant::now());
            st.status = RunStatus::Running;
        }
        info!("run started");
        emit(
            &self.events,
            TrackerEvent::StatusChanged {
                status: RunStatus::Running,
            },
        );
        self.spawn_ticker();
        self.begin_sampling();
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), TrackerError> {
        let (handle, elapsed_ms) = {
            let mut st = lock(&self.shared);
            ensure(&st, Operation::Pause, &[RunStatus::Running])?;
            st.bank_segment(Instant::now());
            st.status = RunStatus::Paused;
            (detach_sampling(&mut st), st.banked.as_millis() as u64)
        };
        self.cancel_ticker();
        if let Some(h) = handle {
            self.provider.unsubscribe(h);
        }
        info!(elapsed_ms, "run paused");
        emit(
            &self.events,
            TrackerEvent::StatusChanged {
                status: RunStatus::Paused,
            },
        );
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), TrackerError> {
        {
            let mut st = lock(&self.shared);
            ensure(&st, Operation::Resume, &[RunStatus::Paused])?;
            st.segment_start = Some(Instant::now());
            st.status = RunStatus::Running;
        }
        info!("run resumed");
        emit(
            &self.events,
            TrackerEvent::StatusChanged {
                status: RunStatus::Running,
            },
        );
        self.spawn_ticker();
        self.begin_sampling();
        Ok(())
    }

    /// Finish the run and hand back its record.
    pub fn stop(&mut self) -> Result<RunRecord, TrackerError> {
        let (handle, record) = {
            let mut st = lock(&self.shared);
            ensure(
                &st,
                Operation::Stop,
                &[RunStatus::Running, RunStatus::Paused],
            )?;
            st.bank_segment(Instant::now());
            st.status = RunStatus::Finished;
            (detach_sampling(&mut st), finalize(&st))
        };
        self.cancel_ticker();
        if let Some(h) = handle {
            self.provider.unsubscribe(h);
        }
        info!(
            distance_km = record.distance_km,
            duration_sec = record.duration_sec,
            elevation_gain_m = record.elevation_gain_m,
            "run finished"
        );
        emit(
            &self.events,
            TrackerEvent::StatusChanged {
                status: RunStatus::Finished,
            },
        );
        emit(
            &self.events,
            TrackerEvent::Finished {
                record: Box::new(record.clone()),
            },
        );
        Ok(record)
    }

    /// Return to idle from any state, discarding the current run.
    pub fn reset(&mut self) {
        self.cancel_ticker();
        let handle = {
            let mut st = lock(&self.shared);
            let handle = detach_sampling(&mut st);
            *st = RunState::default();
            handle
        };
        if let Some(h) = handle {
            self.provider.unsubscribe(h);
        }
        info!("run reset");
        emit(
            &self.events,
            TrackerEvent::StatusChanged {
                status: RunStatus::Idle,
            },
        );
    }

    fn begin_sampling(&mut self) {
        if !self.provider.is_available() {
            warn!("no location source on this platform");
            lock(&self.shared).last_error = Some(UNSUPPORTED_MESSAGE.to_string());
            emit(
                &self.events,
                TrackerEvent::LocationError {
                    message: UNSUPPORTED_MESSAGE.to_string(),
                },
            );
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        lock(&self.shared).sampling = Some(generation);

        let sink = self.sample_sink(generation);
        match self.provider.subscribe(&self.config.sampling, sink) {
            Ok(handle) => {
                let mut st = lock(&self.shared);
                if st.sampling == Some(generation) {
                    st.subscription = Some(handle);
                    debug!(generation, "location subscription open");
                } else {
                    // Failed before subscribe returned.
                    drop(st);
                    self.provider.unsubscribe(handle);
                }
            }
            Err(e) => {
                let message = e.to_string();
                warn!(error = %message, "location subscription refused");
                {
                    let mut st = lock(&self.shared);
                    if st.sampling == Some(generation) {
                        st.sampling = None;
                    }
                    st.last_error = Some(message.clone());
                }
                emit(&self.events, TrackerEvent::LocationError { message });
            }
        }
    }

    fn sample_sink(&self, generation: u64) -> SampleSink {
        let shared = Arc::clone(&self.shared);
        let events = self.events.clone();
        let provider = Arc::clone(&self.provider);
        SampleSink::new(move |update| {
            let mut st = lock(&shared);
            if st.sampling != Some(generation) {
                trace!(generation, "dropping reading from closed subscription");
                return;
            }
            match update {
                Ok(sample) => {
                    st.integrate(sample);
                    let snapshot = st.snapshot(Instant::now());
                    drop(st);
                    emit(&events, TrackerEvent::Sample { snapshot });
                }
                Err(err) => {
                    let message = err.to_string();
                    st.last_error = Some(message.clone());
                    let handle = detach_sampling(&mut st);
                    drop(st);
                    warn!(error = %message, "location delivery failed, sampling halted");
                    if let Some(h) = handle {
                        provider.unsubscribe(h);
                    }
                    emit(&events, TrackerEvent::LocationError { message });
                }
            }
        })
    }

    fn spawn_ticker(&mut self) {
        self.cancel_ticker();
        let Ok(rt) = tokio::runtime::Handle::try_current() else {
            debug!("no runtime, elapsed time is only computed on demand");
            return;
        };
        let shared = Arc::clone(&self.shared);
        let events = self.events.clone();
        let period = self.config.tick_interval.max(MIN_TICK);

        self.ticker = Some(rt.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let elapsed_ms = {
                    let st = lock(&shared);
                    if st.status != RunStatus::Running {
                        break;
                    }
                    st.elapsed(Instant::now()).as_millis() as u64
                };
                emit(&events, TrackerEvent::Tick { elapsed_ms });
            }
        }));
    }

    fn cancel_ticker(&mut self) {
        if let Some(t) = self.ticker.take() {
            t.abort();
        }
    }
}

impl Drop for RunTracker {
    fn drop(&mut self) {
        self.cancel_ticker();
        let handle = detach_sampling(&mut lock(&self.shared));
        if let Some(h) = handle {
            self.provider.unsubscribe(h);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::geo::haversine_km;
    use super::*;
    use crate::model::SamplingOptions;
    use crate::provider::{LocationError, LocationUpdate, UnavailableProvider};
    use tokio::sync::mpsc;

    /// Hands readings to the most recent sink on demand, even after it was unsubscribed.
    #[derive(Default)]
    struct ManualProvider {
        sinks: Mutex<Vec<SampleSink>>,
        open: Mutex<Vec<SubscriptionHandle>>,
    }

    impl ManualProvider {
        fn push(&self, update: LocationUpdate) {
            let sink = self.sinks.lock().unwrap().last().cloned();
            if let Some(sink) = sink {
                sink.deliver(update);
            }
        }

        fn open_count(&self) -> usize {
            self.open.lock().unwrap().len()
        }

        fn subscribe_count(&self) -> usize {
            self.sinks.lock().unwrap().len()
        }
    }

    impl LocationProvider for ManualProvider {
        fn subscribe(
            &self,
            _options: &SamplingOptions,
            sink: SampleSink,
        ) -> Result<SubscriptionHandle, LocationError> {
            let handle = SubscriptionHandle::next();
            self.sinks.lock().unwrap().push(sink);
            self.open.lock().unwrap().push(handle);
            Ok(handle)
        }

        fn unsubscribe(&self, handle: SubscriptionHandle) {
            self.open.lock().unwrap().retain(|h| *h != handle);
        }
    }

    fn tracker() -> (RunTracker, Arc<ManualProvider>) {
        let provider = Arc::new(ManualProvider::default());
        let tracker = RunTracker::new(provider.clone(), TrackerConfig::default());
        (tracker, provider)
    }

    fn at(lat: f64, alt: f64) -> PositionSample {
        PositionSample::new(lat, -46.6576, 0).with_altitude(alt)
    }

    #[test]
    fn follows_the_lifecycle_table() {
        let (mut t, provider) = tracker();
        assert_eq!(t.status(), RunStatus::Idle);
        t.start().unwrap();
        assert_eq!(t.status(), RunStatus::Running);
        assert_eq!(provider.open_count(), 1);
        t.pause().unwrap();
        assert_eq!(t.status(), RunStatus::Paused);
        assert_eq!(provider.open_count(), 0);
        t.resume().unwrap();
        assert_eq!(t.status(), RunStatus::Running);
        assert_eq!(provider.open_count(), 1);
        t.stop().unwrap();
        assert_eq!(t.status(), RunStatus::Finished);
        assert_eq!(provider.open_count(), 0);
        t.reset();
        assert_eq!(t.status(), RunStatus::Idle);
        t.start().unwrap();
        assert_eq!(t.status(), RunStatus::Running);
    }

    #[test]
    fn out_of_order_calls_are_rejected_without_touching_the_run() {
        let (mut t, provider) = tracker();
        assert_eq!(
            t.pause(),
            Err(TrackerError::InvalidTransition {
                op: Operation::Pause,
                from: RunStatus::Idle
            })
        );
        assert!(t.resume().is_err());
        assert!(t.stop().is_err());
        assert_eq!(t.status(), RunStatus::Idle);

        t.start().unwrap();
        provider.push(Ok(at(0.000, 100.0)));
        provider.push(Ok(at(0.001, 104.0)));
        let before = t.snapshot();

        assert!(t.start().is_err());
        assert!(t.resume().is_err());
        let after = t.snapshot();
        assert_eq!(after.distance_km, before.distance_km);
        assert_eq!(after.elevation_gain_m, before.elevation_gain_m);
        assert_eq!(after.sample_count, 2);
        assert_eq!(provider.subscribe_count(), 1);

        t.stop().unwrap();
        assert!(t.stop().is_err());
        assert!(t.pause().is_err());
        assert_eq!(t.status(), RunStatus::Finished);
    }

    #[test]
    fn integrates_distance_and_climb_from_readings() {
        let (mut t, provider) = tracker();
        t.start().unwrap();
        let track = [at(0.000, 100.0), at(0.001, 95.0), at(0.002, 110.0)];
        for s in &track {
            provider.push(Ok(s.clone()));
        }
        let snap = t.snapshot();
        let expected = haversine_km(&track[0], &track[1]) + haversine_km(&track[1], &track[2]);
        assert!((snap.distance_km - expected).abs() < 1e-12);
        assert_eq!(snap.elevation_gain_m, 15.0);
        assert_eq!(t.samples(), track.to_vec());
    }

    #[test]
    fn climb_after_a_dip_counts_only_the_rise() {
        let (mut t, provider) = tracker();
        t.start().unwrap();
        for alt in [100.0, 95.0, 110.0] {
            provider.push(Ok(at(0.0, alt)));
        }
        assert_eq!(t.snapshot().elevation_gain_m, 15.0);

        let (mut t, provider) = tracker();
        t.start().unwrap();
        for alt in [100.0, 95.0, 105.0] {
            provider.push(Ok(at(0.0, alt)));
        }
        assert_eq!(t.snapshot().elevation_gain_m, 10.0);
    }

    #[test]
    fn current_pace_follows_latest_speed() {
        let (mut t, provider) = tracker();
        t.start().unwrap();
        provider.push(Ok(at(0.0, 0.0).with_speed(2.0)));
        assert!((t.snapshot().current_pace - 8.333).abs() < 1e-3);
        provider.push(Ok(at(0.0, 0.0).with_speed(0.2)));
        assert_eq!(t.snapshot().current_pace, 0.0);
        provider.push(Ok(at(0.0, 0.0)));
        assert_eq!(t.snapshot().current_speed_mps, 0.0);
    }

    #[test]
    fn readings_while_paused_are_dropped() {
        let (mut t, provider) = tracker();
        t.start().unwrap();
        provider.push(Ok(at(0.000, 100.0)));
        t.pause().unwrap();
        provider.push(Ok(at(0.010, 200.0)));
        assert_eq!(t.snapshot().sample_count, 1);
        assert_eq!(t.snapshot().distance_km, 0.0);

        t.resume().unwrap();
        provider.push(Ok(at(0.001, 101.0)));
        let snap = t.snapshot();
        assert_eq!(snap.sample_count, 2);
        assert!(snap.distance_km > 0.1);
        assert_eq!(snap.elevation_gain_m, 1.0);
    }

    #[test]
    fn delivery_error_halts_sampling_for_the_rest_of_the_run() {
        let (mut t, provider) = tracker();
        t.start().unwrap();
        provider.push(Ok(at(0.000, 100.0)));
        provider.push(Err(LocationError::timeout("Timeout expired")));

        let snap = t.snapshot();
        assert_eq!(snap.status, RunStatus::Running);
        assert_eq!(snap.error.as_deref(), Some("ERROR(3): Timeout expired"));
        assert_eq!(provider.open_count(), 0);

        provider.push(Ok(at(0.005, 150.0)));
        let after = t.snapshot();
        assert_eq!(after.sample_count, 1);
        assert_eq!(after.distance_km, 0.0);
        assert_eq!(after.elevation_gain_m, 0.0);

        // pause/resume re-subscribes
        t.pause().unwrap();
        t.resume().unwrap();
        assert_eq!(provider.subscribe_count(), 2);
        provider.push(Ok(at(0.001, 102.0)));
        assert_eq!(t.snapshot().sample_count, 2);
    }

    #[test]
    fn refused_subscription_surfaces_error_and_keeps_running() {
        let mut t = RunTracker::new(Arc::new(UnavailableProvider), TrackerConfig::default());
        t.start().unwrap();
        let snap = t.snapshot();
        assert_eq!(snap.status, RunStatus::Running);
        assert_eq!(snap.error.as_deref(), Some(UNSUPPORTED_MESSAGE));

        let record = t.stop().unwrap();
        assert_eq!(record.distance_km, 0.0);
        assert_eq!(record.avg_pace_sec_per_km, 0.0);
        assert_eq!(record.elevation_gain_m, 0);
    }

    #[test]
    fn reset_clears_the_run_and_only_start_is_valid_next() {
        let (mut t, provider) = tracker();
        t.start().unwrap();
        provider.push(Ok(at(0.000, 100.0).with_speed(3.0)));
        provider.push(Ok(at(0.001, 120.0)));
        provider.push(Err(LocationError::permission_denied("denied")));
        t.stop().unwrap();
        t.reset();

        let snap = t.snapshot();
        assert_eq!(snap.status, RunStatus::Idle);
        assert_eq!(snap.distance_km, 0.0);
        assert_eq!(snap.elevation_gain_m, 0.0);
        assert_eq!(snap.current_speed_mps, 0.0);
        assert_eq!(snap.elapsed_ms, 0);
        assert_eq!(snap.sample_count, 0);
        assert_eq!(snap.error, None);
        assert_eq!(snap.started_at, None);

        assert!(t.pause().is_err());
        assert!(t.resume().is_err());
        assert!(t.stop().is_err());
        assert!(t.start().is_ok());
    }

    #[test]
    fn reset_aborts_a_running_run() {
        let (mut t, provider) = tracker();
        t.start().unwrap();
        provider.push(Ok(at(0.000, 100.0)));
        t.reset();
        assert_eq!(t.status(), RunStatus::Idle);
        assert_eq!(provider.open_count(), 0);
        provider.push(Ok(at(0.001, 100.0)));
        assert_eq!(t.snapshot().sample_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_time_is_not_counted() {
        let (mut t, _provider) = tracker();
        t.start().unwrap();
        tokio::time::sleep(Duration::from_millis(5000)).await;
        t.pause().unwrap();
        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(t.snapshot().elapsed_ms, 5000);
        t.resume().unwrap();
        tokio::time::sleep(Duration::from_millis(3000)).await;
        let record = t.stop().unwrap();
        assert_eq!(record.duration_sec, 8);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_right_after_start_yields_an_empty_record() {
        let (mut t, _provider) = tracker();
        t.start().unwrap();
        tokio::time::sleep(Duration::from_millis(2400)).await;
        let record = t.stop().unwrap();
        assert_eq!(record.distance_km, 0.0);
        assert_eq!(record.avg_pace_sec_per_km, 0.0);
        assert_eq!(record.elevation_gain_m, 0);
        assert_eq!(record.duration_sec, 2);
        assert_eq!(record.source, RunSource::App);
        assert_eq!(record.strava_id, None);
        assert_eq!(record.date.len(), 10);
        assert_eq!(record.date.as_bytes()[4], b'-');
        assert_eq!(record.date.as_bytes()[7], b'-');
    }

    #[tokio::test(start_paused = true)]
    async fn record_rounds_distance_and_derives_pace() {
        let (mut t, provider) = tracker();
        t.start().unwrap();
        provider.push(Ok(at(0.00, 100.0)));
        tokio::time::sleep(Duration::from_secs(600)).await;
        provider.push(Ok(at(0.01, 112.6)));
        let exact_km = t.snapshot().distance_km;
        let record = t.stop().unwrap();

        assert_eq!(record.distance_km, 1.11);
        assert_eq!(record.duration_sec, 600);
        assert!((record.avg_pace_sec_per_km - 600.0 / exact_km).abs() < 1e-9);
        assert_eq!(record.elevation_gain_m, 13);
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_events_for_every_change() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let provider = Arc::new(ManualProvider::default());
        let mut t = RunTracker::new(provider.clone(), TrackerConfig::default()).with_events(tx);

        t.start().unwrap();
        assert!(matches!(
            rx.try_recv(),
            Ok(TrackerEvent::StatusChanged {
                status: RunStatus::Running
            })
        ));

        provider.push(Ok(at(0.0, 0.0).with_speed(2.0)));
        match rx.try_recv() {
            Ok(TrackerEvent::Sample { snapshot }) => assert_eq!(snapshot.sample_count, 1),
            other => panic!("expected sample event, got {other:?}"),
        }

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(matches!(
            rx.try_recv(),
            Ok(TrackerEvent::Tick { elapsed_ms: 1000 })
        ));

        t.pause().unwrap();
        assert!(matches!(
            rx.try_recv(),
            Ok(TrackerEvent::StatusChanged {
                status: RunStatus::Paused
            })
        ));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err(), "ticker must stop while paused");

        t.resume().unwrap();
        let _ = rx.try_recv();
        let record = t.stop().unwrap();
        let _ = rx.try_recv();
        match rx.try_recv() {
            Ok(TrackerEvent::Finished { record: r }) => assert_eq!(*r, record),
            other => panic!("expected finished event, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_follow_configured_interval() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cfg = TrackerConfig {
            tick_interval: Duration::from_millis(250),
            ..Default::default()
        };
        let mut t = RunTracker::new(Arc::new(ManualProvider::default()), cfg).with_events(tx);
        t.start().unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;
        let ticks: Vec<u64> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|ev| match ev {
                TrackerEvent::Tick { elapsed_ms } => Some(elapsed_ms),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, vec![250, 500, 750, 1000]);
    }
}
