use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw geolocation sample as delivered by the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub lat: f64,
    pub lon: f64,
    pub accuracy_m: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub reported_speed_ms: Option<f64>,
}

impl Fix {
    pub fn new(lat: f64, lon: f64, accuracy_m: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            lat,
            lon,
            accuracy_m,
            timestamp,
            reported_speed_ms: None,
        }
    }

    pub fn with_reported_speed(mut self, speed_ms: f64) -> Self {
        self.reported_speed_ms = Some(speed_ms);
        self
    }

    pub fn position(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }
}

/// Why a fix did not contribute distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    LowAccuracy,
    Jitter,
    ImplausibleJump,
    NonIncreasingTime,
}

/// Outcome of running one fix through the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FixDecision {
    /// The fix passed every gate and becomes the new distance anchor.
    pub accepted: bool,
    pub distance_delta_km: f64,
    /// Geometric speed against the anchor; 0 when there is no anchor.
    pub implied_speed_kmh: f64,
    /// Speed to display, `None` when the fix carries no usable speed signal
    /// at all (low accuracy).
    pub speed_kmh: Option<f64>,
    pub rejection: Option<Rejection>,
}

impl FixDecision {
    pub fn baseline(speed_kmh: f64) -> Self {
        Self {
            accepted: true,
            distance_delta_km: 0.0,
            implied_speed_kmh: 0.0,
            speed_kmh: Some(speed_kmh),
            rejection: None,
        }
    }

    pub fn rejected(rejection: Rejection, implied_speed_kmh: f64, speed_kmh: Option<f64>) -> Self {
        Self {
            accepted: false,
            distance_delta_km: 0.0,
            implied_speed_kmh,
            speed_kmh,
            rejection: Some(rejection),
        }
    }
}

/// Failure reported by the geolocation source instead of a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorError {
    PermissionDenied,
    Unsupported,
    SignalLost,
    Timeout,
}

impl SensorError {
    /// Permanent failures mean no fix will ever arrive this session.
    pub fn is_permanent(&self) -> bool {
        matches!(self, SensorError::PermissionDenied | SensorError::Unsupported)
    }
}
