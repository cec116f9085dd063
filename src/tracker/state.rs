use super::geo::{elevation_gain_m, haversine_km};
use crate::metrics;
use crate::model::{PositionSample, RunStatus, TrackerSnapshot};
use crate::provider::SubscriptionHandle;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::time::Instant;
use tracing::trace;

/// Canonical state of the open run. Only the tracker mutates it, always under one lock.
#[derive(Debug, Default)]
pub(crate) struct RunState {
    pub status: RunStatus,
    pub started_at: Option<OffsetDateTime>,
    /// Start of the current running segment; `None` unless running.
    pub segment_start: Option<Instant>,
    /// Active time banked by previous running segments.
    pub banked: Duration,
    pub distance_km: f64,
    pub elevation_gain_m: f64,
    pub current_speed_mps: f64,
    pub last_error: Option<String>,
    pub samples: Vec<PositionSample>,
    /// Generation of the subscription whose readings are currently accepted.
    pub sampling: Option<u64>,
    pub subscription: Option<SubscriptionHandle>,
}

impl RunState {
    pub fn elapsed(&self, now: Instant) -> Duration {
        match self.segment_start {
            Some(start) => self.banked + now.saturating_duration_since(start),
            None => self.banked,
        }
    }

    /// Close the running segment, folding its time into the banked total.
    pub fn bank_segment(&mut self, now: Instant) {
        self.banked = self.elapsed(now);
        self.segment_start = None;
    }

    pub fn clear_run(&mut self) {
        self.distance_km = 0.0;
        self.elevation_gain_m = 0.0;
        self.current_speed_mps = 0.0;
        self.banked = Duration::ZERO;
        self.segment_start = None;
        self.started_at = None;
        self.last_error = None;
        self.samples.clear();
    }

    /// Fold one reading into the accumulators.
    pub fn integrate(&mut self, sample: PositionSample) {
        self.current_speed_mps = sample.speed.unwrap_or(0.0);
        if let Some(prev) = self.samples.last() {
            let step_km = haversine_km(prev, &sample);
            let climb_m = elevation_gain_m(prev, &sample);
            self.distance_km += step_km;
            self.elevation_gain_m += climb_m;
            trace!(step_km, climb_m, total_km = self.distance_km, "sample integrated");
        }
        self.samples.push(sample);
    }

    pub fn snapshot(&self, now: Instant) -> TrackerSnapshot {
        TrackerSnapshot {
            status: self.status,
            error: self.last_error.clone(),
            distance_km: self.distance_km,
            elapsed_ms: self.elapsed(now).as_millis() as u64,
            current_pace: metrics::current_pace_min_per_km(self.current_speed_mps),
            elevation_gain_m: self.elevation_gain_m,
            current_speed_mps: self.current_speed_mps,
            sample_count: self.samples.len(),
            started_at: self.started_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(lat: f64, lon: f64, alt: Option<f64>) -> PositionSample {
        PositionSample {
            latitude: lat,
            longitude: lon,
            altitude: alt,
            speed: None,
            timestamp: 0,
        }
    }

    #[test]
    fn distance_is_sum_of_consecutive_pairs() {
        let track = [
            sample(-23.5874, -46.6576, None),
            sample(-23.5880, -46.6570, None),
            sample(-23.5890, -46.6571, None),
            sample(-23.5885, -46.6590, None),
        ];
        let mut st = RunState::default();
        for s in track.iter().cloned() {
            st.integrate(s);
        }
        let expected: f64 = track.windows(2).map(|w| haversine_km(&w[0], &w[1])).sum();
        assert!((st.distance_km - expected).abs() < 1e-12);
        assert_eq!(st.samples.len(), 4);
    }

    #[test]
    fn elevation_counts_only_climbs() {
        let mut st = RunState::default();
        for alt in [100.0, 95.0, 110.0] {
            st.integrate(sample(0.0, 0.0, Some(alt)));
        }
        assert_eq!(st.elevation_gain_m, 15.0);
    }

    #[test]
    fn first_sample_sets_speed_but_adds_no_distance() {
        let mut st = RunState::default();
        st.integrate(sample(1.0, 1.0, Some(10.0)).with_speed(2.5));
        assert_eq!(st.distance_km, 0.0);
        assert_eq!(st.elevation_gain_m, 0.0);
        assert_eq!(st.current_speed_mps, 2.5);

        st.integrate(sample(1.0, 1.0, Some(10.0)));
        assert_eq!(st.current_speed_mps, 0.0);
    }

    #[test]
    fn elapsed_excludes_time_outside_segments() {
        let t0 = Instant::now();
        let mut st = RunState {
            segment_start: Some(t0),
            ..Default::default()
        };
        st.bank_segment(t0 + Duration::from_secs(5));
        assert_eq!(st.elapsed(t0 + Duration::from_secs(60)), Duration::from_secs(5));

        st.segment_start = Some(t0 + Duration::from_secs(15));
        assert_eq!(
            st.elapsed(t0 + Duration::from_secs(18)),
            Duration::from_secs(8)
        );
    }
}
