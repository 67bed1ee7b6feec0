use crate::error::SessionError;
use crate::types::fix::{Fix, FixDecision};

/// Running distance total plus the polyline of accepted fixes.
///
/// The total only ever grows: filter deltas are non-negative by construction
/// and manual increments are validated before they are added.
#[derive(Debug, Clone, Default)]
pub struct DistanceAccumulator {
    total_km: f64,
    route: Vec<(f64, f64)>,
}

impl DistanceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, decision: &FixDecision, fix: &Fix) -> f64 {
        if decision.accepted {
            self.total_km += decision.distance_delta_km.max(0.0);
            self.route.push(fix.position());
        }
        self.total_km
    }

    pub fn add_manual(&mut self, km: f64) -> Result<f64, SessionError> {
        if !km.is_finite() || km <= 0.0 {
            return Err(SessionError::InvalidIncrement(km));
        }
        self.total_km += km;
        Ok(self.total_km)
    }

    pub fn total_km(&self) -> f64 {
        self.total_km
    }

    pub fn route(&self) -> &[(f64, f64)] {
        &self.route
    }
}
