use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::TrackingConfig;
use crate::error::SessionError;
use crate::pipeline::accumulate::DistanceAccumulator;
use crate::pipeline::filter::FixFilter;
use crate::pipeline::heart_rate::HeartRateHistory;
use crate::pipeline::laps::LapDispatcher;
use crate::pipeline::pace::{self, SpeedDecay};
use crate::types::fix::{Fix, FixDecision, Rejection};
use crate::types::session::{
    GpsStatus, Lap, SessionPhase, SessionSnapshot, SessionView, TrackingMode, WorkoutConfig,
};

/// What happened to a fix handed to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum FixOutcome {
    /// Not consumed: treadmill mode, paused, or not running.
    Ignored,
    Processed {
        decision: FixDecision,
        laps: Vec<Lap>,
    },
}

impl FixOutcome {
    pub fn laps(&self) -> &[Lap] {
        match self {
            FixOutcome::Ignored => &[],
            FixOutcome::Processed { laps, .. } => laps,
        }
    }
}

/// Consecutive fixes older than the anchor before the anchor itself is
/// treated as the outlier and replaced.
const STALE_ANCHOR_LIMIT: u32 = 3;

/// Live state of one workout.
///
/// Every mutation is a single method call touching only the fields it owns,
/// so the session can sit behind one actor and take ticks, fixes and
/// heart-rate samples in any interleaving.
#[derive(Debug, Clone)]
pub struct TrackingSession {
    id: Uuid,
    config: WorkoutConfig,
    phase: SessionPhase,
    filter: FixFilter,
    distance: DistanceAccumulator,
    dispatcher: LapDispatcher,
    laps: Vec<Lap>,
    heart_rate: HeartRateHistory,
    elapsed_seconds: u64,
    current_speed_kmh: f64,
    speed_decay: SpeedDecay,
    last_accepted_fix: Option<Fix>,
    stale_anchor_rejections: u32,
    last_position: Option<(f64, f64)>,
    gps_status: GpsStatus,
    started_at: Option<DateTime<Utc>>,
}

impl TrackingSession {
    pub fn new(id: Uuid, config: WorkoutConfig, tracking: &TrackingConfig) -> Self {
        let gps_status = match config.mode {
            TrackingMode::Outdoor => GpsStatus::Waiting,
            TrackingMode::Treadmill => GpsStatus::NotUsed,
        };

        Self {
            id,
            config,
            phase: SessionPhase::Configuring,
            filter: FixFilter::new(tracking.filter.clone()),
            distance: DistanceAccumulator::new(),
            dispatcher: LapDispatcher::new(),
            laps: Vec::new(),
            heart_rate: HeartRateHistory::new(),
            elapsed_seconds: 0,
            current_speed_kmh: 0.0,
            speed_decay: SpeedDecay::new(tracking.speed_stale_after_seconds),
            last_accepted_fix: None,
            stale_anchor_rejections: 0,
            last_position: None,
            gps_status,
            started_at: None,
        }
    }

    /// Returns `false` when the session was already running.
    pub fn start(&mut self) -> Result<bool, SessionError> {
        match self.phase {
            SessionPhase::Configuring => {
                self.phase = SessionPhase::Active;
                self.started_at = Some(Utc::now());
                tracing::info!(
                    session = %self.id,
                    mode = ?self.config.mode,
                    activity = ?self.config.activity,
                    "Session started"
                );
                Ok(true)
            }
            SessionPhase::Active | SessionPhase::Paused => Ok(false),
            SessionPhase::Finished => Err(SessionError::Finished),
        }
    }

    pub fn pause(&mut self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Active => {
                self.phase = SessionPhase::Paused;
                self.current_speed_kmh = 0.0;
                tracing::info!(session = %self.id, elapsed = self.elapsed_seconds, "Session paused");
                Ok(())
            }
            SessionPhase::Paused => Ok(()),
            SessionPhase::Configuring => Err(SessionError::NotStarted),
            SessionPhase::Finished => Err(SessionError::Finished),
        }
    }

    /// The anchor fix is dropped, so the first fix after resuming only
    /// re-establishes the baseline.
    pub fn resume(&mut self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Paused => {
                self.phase = SessionPhase::Active;
                self.last_accepted_fix = None;
                self.stale_anchor_rejections = 0;
                self.speed_decay.on_fix();
                tracing::info!(session = %self.id, elapsed = self.elapsed_seconds, "Session resumed");
                Ok(())
            }
            SessionPhase::Active => Ok(()),
            SessionPhase::Configuring => Err(SessionError::NotStarted),
            SessionPhase::Finished => Err(SessionError::Finished),
        }
    }

    /// One second of active time. Returns whether the tick counted.
    pub fn tick(&mut self) -> bool {
        if self.phase != SessionPhase::Active {
            return false;
        }
        self.elapsed_seconds += 1;
        if self.config.mode == TrackingMode::Outdoor {
            self.current_speed_kmh = self.speed_decay.on_tick(self.current_speed_kmh);
        }
        true
    }

    /// Jump elapsed time forward to `elapsed_seconds` as if ticked once per
    /// second. Returns the number of seconds added.
    pub fn advance_to(&mut self, elapsed_seconds: u64) -> u64 {
        if self.phase != SessionPhase::Active || elapsed_seconds <= self.elapsed_seconds {
            return 0;
        }
        let ticks = elapsed_seconds - self.elapsed_seconds;
        self.elapsed_seconds = elapsed_seconds;
        if self.config.mode == TrackingMode::Outdoor {
            self.current_speed_kmh = self.speed_decay.on_ticks(ticks, self.current_speed_kmh);
        }
        ticks
    }

    pub fn ingest_fix(&mut self, fix: Fix) -> FixOutcome {
        if self.phase != SessionPhase::Active || self.config.mode == TrackingMode::Treadmill {
            return FixOutcome::Ignored;
        }

        let mut decision = self.filter.accept(&fix, self.last_accepted_fix.as_ref());

        if decision.rejection == Some(Rejection::NonIncreasingTime) {
            self.stale_anchor_rejections += 1;
            if self.stale_anchor_rejections >= STALE_ANCHOR_LIMIT {
                tracing::warn!(
                    session = %self.id,
                    rejections = self.stale_anchor_rejections,
                    "Anchor fix is ahead of incoming fixes; re-establishing baseline"
                );
                self.last_accepted_fix = None;
                decision = self.filter.accept(&fix, None);
            }
        }
        if decision.rejection != Some(Rejection::NonIncreasingTime) {
            self.stale_anchor_rejections = 0;
        }

        if let Some(speed_kmh) = decision.speed_kmh {
            self.current_speed_kmh = speed_kmh;
            self.speed_decay.on_fix();
            self.last_position = Some(fix.position());
            self.gps_status = GpsStatus::Tracking;
        }

        if decision.accepted {
            self.distance.apply(&decision, &fix);
            self.last_accepted_fix = Some(fix);
        } else if let Some(rejection) = decision.rejection {
            tracing::debug!(
                session = %self.id,
                ?rejection,
                accuracy_m = fix.accuracy_m,
                implied_kmh = decision.implied_speed_kmh,
                "Fix rejected"
            );
        }

        let laps = self.drain_laps();
        FixOutcome::Processed { decision, laps }
    }

    pub fn submit_manual_distance_increment(&mut self, km: f64) -> Result<Vec<Lap>, SessionError> {
        if self.config.mode != TrackingMode::Treadmill {
            return Err(SessionError::NotTreadmill);
        }
        match self.phase {
            SessionPhase::Active => {}
            SessionPhase::Paused => return Err(SessionError::Paused),
            SessionPhase::Configuring => return Err(SessionError::NotStarted),
            SessionPhase::Finished => return Err(SessionError::Finished),
        }

        self.distance.add_manual(km)?;
        Ok(self.drain_laps())
    }

    /// `None` is a failed read; it is skipped like an implausible value.
    pub fn record_heart_rate(&mut self, bpm: Option<u16>) -> bool {
        if self.phase != SessionPhase::Active {
            return false;
        }
        self.heart_rate.record(bpm)
    }

    pub fn mark_gps_unavailable(&mut self) {
        if self.config.mode == TrackingMode::Outdoor && self.gps_status != GpsStatus::Unavailable {
            self.gps_status = GpsStatus::Unavailable;
            self.current_speed_kmh = 0.0;
            tracing::warn!(session = %self.id, "Geolocation unavailable; distance is not being tracked");
        }
    }

    pub fn finish(&mut self) -> Result<SessionSnapshot, SessionError> {
        match self.phase {
            SessionPhase::Active | SessionPhase::Paused => {}
            SessionPhase::Configuring => return Err(SessionError::NotStarted),
            SessionPhase::Finished => return Err(SessionError::Finished),
        }

        self.phase = SessionPhase::Finished;
        self.current_speed_kmh = 0.0;
        let snapshot = self.snapshot();

        tracing::info!(
            session = %self.id,
            distance_km = snapshot.total_distance_km,
            elapsed = snapshot.elapsed_seconds,
            laps = snapshot.laps.len(),
            "Session finished"
        );
        Ok(snapshot)
    }

    fn drain_laps(&mut self) -> Vec<Lap> {
        let total_km = self.distance.total_km();
        let pace = self.average_pace_string();
        let mut emitted = Vec::new();

        while let Some(lap) = self
            .dispatcher
            .check_boundary(total_km, self.elapsed_seconds, &pace)
        {
            tracing::info!(
                session = %self.id,
                km = lap.km,
                elapsed = lap.elapsed_seconds,
                pace = %lap.pace_at_lap,
                "Lap completed"
            );
            self.laps.push(lap.clone());
            emitted.push(lap);
        }

        emitted
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            config: self.config.clone(),
            total_distance_km: self.distance.total_km(),
            elapsed_seconds: self.elapsed_seconds,
            pace: self.average_pace_string(),
            route: self.distance.route().to_vec(),
            laps: self.laps.clone(),
            average_heart_rate: self.heart_rate.average(),
            max_heart_rate: self.heart_rate.max(),
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.id,
            phase: self.phase,
            mode: self.config.mode,
            gps_status: self.gps_status,
            total_distance_km: self.total_distance_km(),
            current_speed_kmh: self.current_speed_kmh(),
            average_pace: self.average_pace_string(),
            elapsed_seconds: self.elapsed_seconds,
            elapsed_formatted: self.elapsed_seconds_formatted(),
            laps: self.laps.clone(),
            current_heart_rate: self.current_heart_rate(),
            route_points: self.distance.route().len(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &WorkoutConfig {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn gps_status(&self) -> GpsStatus {
        self.gps_status
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn total_distance_km(&self) -> f64 {
        self.distance.total_km()
    }

    pub fn current_speed_kmh(&self) -> f64 {
        match self.config.mode {
            TrackingMode::Outdoor => self.current_speed_kmh,
            TrackingMode::Treadmill => 0.0,
        }
    }

    pub fn average_pace_string(&self) -> String {
        pace::average_pace_string(self.elapsed_seconds, self.distance.total_km())
    }

    pub fn elapsed_seconds_formatted(&self) -> String {
        pace::format_elapsed(self.elapsed_seconds)
    }

    pub fn laps(&self) -> &[Lap] {
        &self.laps
    }

    pub fn route(&self) -> &[(f64, f64)] {
        self.distance.route()
    }

    pub fn current_heart_rate(&self) -> Option<u16> {
        self.heart_rate.current()
    }

    pub fn heart_rate_history(&self) -> &[u16] {
        self.heart_rate.samples()
    }

    pub fn last_accepted_fix(&self) -> Option<&Fix> {
        self.last_accepted_fix.as_ref()
    }

    /// Most recent position with usable accuracy, accepted for distance or not.
    pub fn last_position(&self) -> Option<(f64, f64)> {
        self.last_position
    }
}
