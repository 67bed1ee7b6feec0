//! Gatekeeper between the raw geolocation stream and everything that
//! accumulates distance.
//!
//! A fix goes through three gates:
//!
//! - accuracy: anything worse than `max_accuracy_m` is dropped outright
//! - jitter: a move of `min_step_km` or less from the anchor is noise
//! - teleport: an implied speed of `max_speed_ms` or more is a GPS jump
//!
//! Only a fix passing all three becomes the new anchor (the last accepted
//! fix) and contributes distance. Speed reporting is decided separately so a
//! standing runner still sees a speed even while distance is gated.

use crate::pipeline::geo::haversine_km;
use crate::types::fix::{Fix, FixDecision, Rejection};

#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub max_accuracy_m: f64,
    pub min_step_km: f64,
    pub max_speed_ms: f64,
    /// Speeds at or above this are never displayed.
    pub max_reported_kmh: f64,
    /// Geometric speeds at or below this read as stationary.
    pub min_implied_kmh: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_accuracy_m: 50.0,
            min_step_km: 0.004,
            max_speed_ms: 10.0,
            max_reported_kmh: 100.0,
            min_implied_kmh: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FixFilter {
    config: FilterConfig,
}

impl FixFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Decide what `fix` contributes given the current anchor.
    pub fn accept(&self, fix: &Fix, previous: Option<&Fix>) -> FixDecision {
        // NaN accuracy fails this comparison too.
        if !(fix.accuracy_m <= self.config.max_accuracy_m) || !is_valid_position(fix) {
            return FixDecision::rejected(Rejection::LowAccuracy, 0.0, None);
        }

        let reported_kmh = self.reported_kmh(fix);

        let Some(previous) = previous else {
            return FixDecision::baseline(reported_kmh.unwrap_or(0.0));
        };

        let dt_seconds = (fix.timestamp - previous.timestamp).num_milliseconds() as f64 / 1000.0;
        if dt_seconds <= 0.0 {
            return FixDecision::rejected(Rejection::NonIncreasingTime, 0.0, None);
        }

        let distance_km = haversine_km(previous.lat, previous.lon, fix.lat, fix.lon);
        let implied_ms = distance_km * 1000.0 / dt_seconds;
        let implied_kmh = implied_ms * 3.6;

        let speed_kmh = reported_kmh.unwrap_or_else(|| {
            if implied_kmh > self.config.min_implied_kmh && implied_kmh < self.config.max_reported_kmh {
                implied_kmh
            } else {
                0.0
            }
        });

        if distance_km <= self.config.min_step_km {
            return FixDecision::rejected(Rejection::Jitter, implied_kmh, Some(speed_kmh));
        }

        if implied_ms >= self.config.max_speed_ms {
            return FixDecision::rejected(Rejection::ImplausibleJump, implied_kmh, Some(speed_kmh));
        }

        FixDecision {
            accepted: true,
            distance_delta_km: distance_km,
            implied_speed_kmh: implied_kmh,
            speed_kmh: Some(speed_kmh),
            rejection: None,
        }
    }

    fn reported_kmh(&self, fix: &Fix) -> Option<f64> {
        fix.reported_speed_ms
            .filter(|speed| speed.is_finite() && *speed >= 0.0)
            .map(|speed| speed * 3.6)
            .filter(|kmh| *kmh < self.config.max_reported_kmh)
    }
}

fn is_valid_position(fix: &Fix) -> bool {
    fix.lat.is_finite()
        && fix.lon.is_finite()
        && (-90.0..=90.0).contains(&fix.lat)
        && (-180.0..=180.0).contains(&fix.lon)
}
