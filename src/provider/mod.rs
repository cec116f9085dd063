//! Location sources.
//!
//! A provider hands position readings to a [`SampleSink`] until it is unsubscribed. The tracker
//! only talks to the [`LocationProvider`] trait, so the device source and the scripted sources are
//! interchangeable.

mod gpsd;
mod synthetic;

pub use gpsd::{GpsdProvider, DEFAULT_GPSD_ADDR};
pub use synthetic::{load_track, SimulatedRoute, SyntheticProvider};

use crate::model::{PositionSample, SamplingOptions};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;

/// Error codes follow the geolocation numbering the mobile app received from the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum LocationErrorCode {
    PermissionDenied = 1,
    PositionUnavailable = 2,
    Timeout = 3,
}

impl LocationErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

impl From<LocationErrorCode> for u16 {
    fn from(code: LocationErrorCode) -> Self {
        code.as_u16()
    }
}

impl TryFrom<u16> for LocationErrorCode {
    type Error = String;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::PermissionDenied),
            2 => Ok(Self::PositionUnavailable),
            3 => Ok(Self::Timeout),
            other => Err(format!("unknown location error code {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("ERROR({}): {}", .code.as_u16(), .message)]
pub struct LocationError {
    pub code: LocationErrorCode,
    pub message: String,
}

impl LocationError {
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self {
            code: LocationErrorCode::PermissionDenied,
            message: message.into(),
        }
    }

    pub fn position_unavailable(message: impl Into<String>) -> Self {
        Self {
            code: LocationErrorCode::PositionUnavailable,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            code: LocationErrorCode::Timeout,
            message: message.into(),
        }
    }
}

pub type LocationUpdate = Result<PositionSample, LocationError>;

/// Callback target for readings produced by a subscription.
#[derive(Clone)]
pub struct SampleSink {
    inner: Arc<dyn Fn(LocationUpdate) + Send + Sync>,
}

impl SampleSink {
    pub fn new(f: impl Fn(LocationUpdate) + Send + Sync + 'static) -> Self {
        Self { inner: Arc::new(f) }
    }

    pub fn deliver(&self, update: LocationUpdate) {
        (self.inner)(update)
    }
}

impl fmt::Debug for SampleSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SampleSink")
    }
}

/// Opaque handle for an open subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

pub trait LocationProvider: Send + Sync {
    /// Whether this platform can produce locations at all.
    fn is_available(&self) -> bool {
        true
    }

    /// Start delivering readings to `sink`. Returns without waiting for the first reading.
    fn subscribe(
        &self,
        options: &SamplingOptions,
        sink: SampleSink,
    ) -> Result<SubscriptionHandle, LocationError>;

    /// Stop a subscription. Unknown or already closed handles are ignored.
    fn unsubscribe(&self, handle: SubscriptionHandle);
}

pub(crate) fn epoch_ms(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

/// A platform without any location source.
#[derive(Debug, Default)]
pub struct UnavailableProvider;

impl LocationProvider for UnavailableProvider {
    fn is_available(&self) -> bool {
        false
    }

    fn subscribe(
        &self,
        _options: &SamplingOptions,
        _sink: SampleSink,
    ) -> Result<SubscriptionHandle, LocationError> {
        Err(LocationError::position_unavailable(
            "Geolocation is not supported on this platform.",
        ))
    }

    fn unsubscribe(&self, _handle: SubscriptionHandle) {}
}
