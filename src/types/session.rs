use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingMode {
    Outdoor,
    Treadmill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Running,
    Cycling,
    Walking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Configuring,
    Active,
    Paused,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpsStatus {
    /// No fix received yet.
    Waiting,
    Tracking,
    /// Permission denied or no geolocation support; distance is not tracked.
    Unavailable,
    /// Treadmill sessions never consume GPS.
    NotUsed,
}

/// What the user confirmed on the workout setup screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutConfig {
    #[serde(default = "default_activity")]
    pub activity: ActivityKind,
    #[serde(default = "default_mode")]
    pub mode: TrackingMode,
    #[serde(default)]
    pub target_distance_km: Option<f64>,
    #[serde(default)]
    pub target_duration_seconds: Option<u64>,
    #[serde(default)]
    pub terrain: Option<String>,
    #[serde(default)]
    pub voice_cues: bool,
    /// Sample a simulated heart rate instead of waiting for pushed samples.
    #[serde(default)]
    pub simulated_heart_rate: bool,
}

fn default_activity() -> ActivityKind {
    ActivityKind::Running
}

fn default_mode() -> TrackingMode {
    TrackingMode::Outdoor
}

impl WorkoutConfig {
    pub fn new(mode: TrackingMode, voice_cues: bool) -> Self {
        Self {
            activity: ActivityKind::Running,
            mode,
            target_distance_km: None,
            target_duration_seconds: None,
            terrain: None,
            voice_cues,
            simulated_heart_rate: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    pub km: u32,
    pub elapsed_seconds: u64,
    pub pace_at_lap: String,
    /// Seconds spent on this kilometer alone.
    pub split_seconds: u64,
}

/// Read model polled by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub phase: SessionPhase,
    pub mode: TrackingMode,
    pub gps_status: GpsStatus,
    pub total_distance_km: f64,
    pub current_speed_kmh: f64,
    pub average_pace: String,
    pub elapsed_seconds: u64,
    pub elapsed_formatted: String,
    pub laps: Vec<Lap>,
    pub current_heart_rate: Option<u16>,
    pub route_points: usize,
}

/// Terminal, read-only record handed to persistence when a session finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub config: WorkoutConfig,
    pub total_distance_km: f64,
    pub elapsed_seconds: u64,
    pub pace: String,
    pub route: Vec<(f64, f64)>,
    pub laps: Vec<Lap>,
    pub average_heart_rate: Option<u16>,
    pub max_heart_rate: Option<u16>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: DateTime<Utc>,
}
