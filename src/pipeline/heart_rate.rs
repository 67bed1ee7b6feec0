use std::ops::RangeInclusive;

const PLAUSIBLE_BPM: RangeInclusive<u16> = 30..=240;

/// Anything that can be sampled for a heart rate: a strap, a watch, or a
/// simulation. `None` means the read failed and the sample is skipped.
pub trait HeartRateSource: Send + 'static {
    /// `intensity_kmh` is the current speed, usable as an effort hint.
    fn sample(&mut self, intensity_kmh: f64) -> Option<u16>;
}

#[derive(Debug, Clone, Default)]
pub struct HeartRateHistory {
    samples: Vec<u16>,
    current: Option<u16>,
}

impl HeartRateHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the sample was kept.
    pub fn record(&mut self, bpm: Option<u16>) -> bool {
        match bpm {
            Some(bpm) if PLAUSIBLE_BPM.contains(&bpm) => {
                self.samples.push(bpm);
                self.current = Some(bpm);
                true
            }
            _ => false,
        }
    }

    pub fn current(&self) -> Option<u16> {
        self.current
    }

    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    pub fn average(&self) -> Option<u16> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: u64 = self.samples.iter().map(|&bpm| bpm as u64).sum();
        Some((sum as f64 / self.samples.len() as f64).round() as u16)
    }

    pub fn max(&self) -> Option<u16> {
        self.samples.iter().copied().max()
    }
}

/// Deterministic stand-in for a heart-rate strap.
#[derive(Debug, Clone)]
pub struct SimulatedHeartRate {
    resting_bpm: u16,
    max_bpm: u16,
    step: u64,
}

impl SimulatedHeartRate {
    /// Speed at which the simulated effort saturates.
    const FULL_EFFORT_KMH: f64 = 20.0;

    pub fn new(resting_bpm: u16, max_bpm: u16) -> Self {
        Self {
            resting_bpm,
            max_bpm: max_bpm.max(resting_bpm),
            step: 0,
        }
    }
}

impl Default for SimulatedHeartRate {
    fn default() -> Self {
        Self::new(70, 190)
    }
}

impl HeartRateSource for SimulatedHeartRate {
    fn sample(&mut self, intensity_kmh: f64) -> Option<u16> {
        let effort = if intensity_kmh.is_finite() {
            (intensity_kmh / Self::FULL_EFFORT_KMH).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let reserve = (self.max_bpm - self.resting_bpm) as f64;
        let wobble = (self.step as f64 * 0.7).sin() * 3.0;
        self.step += 1;

        let bpm = self.resting_bpm as f64 + reserve * effort * 0.85 + wobble;
        Some(bpm.round().clamp(self.resting_bpm as f64, self.max_bpm as f64) as u16)
    }
}
