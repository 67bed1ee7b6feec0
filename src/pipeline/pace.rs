/// Displayed when pace cannot be computed meaningfully yet.
pub const PACE_SENTINEL: &str = "0'00\"";

const MIN_PACE_DISTANCE_KM: f64 = 0.1;
const MIN_PACE_ELAPSED_SECONDS: u64 = 10;

/// Session-average pace as `M'SS"` per km.
pub fn average_pace_string(elapsed_seconds: u64, distance_km: f64) -> String {
    if !(distance_km >= MIN_PACE_DISTANCE_KM) || elapsed_seconds < MIN_PACE_ELAPSED_SECONDS {
        return PACE_SENTINEL.to_string();
    }

    let pace_min_per_km = (elapsed_seconds as f64 / 60.0) / distance_km;
    format_pace(pace_min_per_km)
}

/// Format decimal minutes per km. Rounded seconds of 60 carry into minutes.
pub fn format_pace(pace_min_per_km: f64) -> String {
    if !pace_min_per_km.is_finite() || pace_min_per_km <= 0.0 {
        return PACE_SENTINEL.to_string();
    }

    let whole = pace_min_per_km.floor();
    let mut mins = whole as u64;
    let mut secs = ((pace_min_per_km - whole) * 60.0).round() as u64;
    if secs >= 60 {
        mins += 1;
        secs -= 60;
    }

    format!("{}'{:02}\"", mins, secs)
}

/// `MM:SS`, or `H:MM:SS` once the hour is reached.
pub fn format_elapsed(elapsed_seconds: u64) -> String {
    let hours = elapsed_seconds / 3600;
    let minutes = (elapsed_seconds % 3600) / 60;
    let seconds = elapsed_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Pulls a stale displayed speed toward zero when fixes stop arriving.
#[derive(Debug, Clone)]
pub struct SpeedDecay {
    stale_after_ticks: u64,
    ticks_since_fix: u64,
}

impl SpeedDecay {
    const SNAP_TO_ZERO_KMH: f64 = 0.5;

    pub fn new(stale_after_ticks: u64) -> Self {
        Self {
            stale_after_ticks,
            ticks_since_fix: 0,
        }
    }

    pub fn on_fix(&mut self) {
        self.ticks_since_fix = 0;
    }

    /// Advance one tick and return the speed to display from now on.
    pub fn on_tick(&mut self, speed_kmh: f64) -> f64 {
        self.ticks_since_fix = self.ticks_since_fix.saturating_add(1);
        if self.ticks_since_fix <= self.stale_after_ticks {
            return speed_kmh;
        }

        let decayed = speed_kmh / 2.0;
        if decayed < Self::SNAP_TO_ZERO_KMH {
            0.0
        } else {
            decayed
        }
    }

    /// Same as calling [`Self::on_tick`] `ticks` times.
    pub fn on_ticks(&mut self, ticks: u64, speed_kmh: f64) -> f64 {
        let fresh_left = self.stale_after_ticks.saturating_sub(self.ticks_since_fix);
        self.ticks_since_fix = self.ticks_since_fix.saturating_add(ticks);
        let halvings = ticks.saturating_sub(fresh_left);
        if halvings == 0 {
            return speed_kmh;
        }

        let decayed = speed_kmh / 2f64.powi(halvings.min(1024) as i32);
        if decayed < Self::SNAP_TO_ZERO_KMH {
            0.0
        } else {
            decayed
        }
    }
}
