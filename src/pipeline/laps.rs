use crate::pipeline::pace::format_elapsed;
use crate::types::session::Lap;

/// Emits one lap per whole kilometer of accumulated distance.
///
/// The check is made against the highest boundary already marked rather than
/// a "just crossed" flag, so re-evaluating the same distance any number of
/// times never yields a second lap for the same kilometer.
#[derive(Debug, Clone, Default)]
pub struct LapDispatcher {
    last_whole_km_marked: u32,
    last_lap_elapsed: u64,
}

impl LapDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_whole_km_marked(&self) -> u32 {
        self.last_whole_km_marked
    }

    /// Returns the lap for the next unmarked boundary at or below
    /// `total_distance_km`, if any. A jump across several kilometers takes
    /// one call per boundary.
    pub fn check_boundary(
        &mut self,
        total_distance_km: f64,
        elapsed_seconds: u64,
        pace: &str,
    ) -> Option<Lap> {
        if !total_distance_km.is_finite() || total_distance_km < 1.0 {
            return None;
        }

        let current_km = total_distance_km.floor().min(u32::MAX as f64) as u32;
        if current_km <= self.last_whole_km_marked {
            return None;
        }

        let km = self.last_whole_km_marked + 1;
        let split_seconds = elapsed_seconds.saturating_sub(self.last_lap_elapsed);
        self.last_whole_km_marked = km;
        self.last_lap_elapsed = elapsed_seconds;

        Some(Lap {
            km,
            elapsed_seconds,
            pace_at_lap: pace.to_string(),
            split_seconds,
        })
    }
}

/// Spoken announcement for a completed lap.
pub fn cue_text(lap: &Lap) -> String {
    format!(
        "{} km completed, elapsed {}, pace {} per km",
        lap.km,
        format_elapsed(lap.elapsed_seconds),
        lap.pace_at_lap
    )
}
