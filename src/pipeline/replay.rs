use uuid::Uuid;

use crate::config::TrackingConfig;
use crate::error::ReplayError;
use crate::session::TrackingSession;
use crate::types::activity::{ParsedActivity, TrackPoint};
use crate::types::fix::Fix;
use crate::types::session::{SessionSnapshot, TrackingMode, WorkoutConfig};

/// Accuracy assumed for recorded points that carry no HDOP.
pub const DEFAULT_ACCURACY_M: f64 = 5.0;
/// Rough user-equivalent range error per unit of HDOP.
const HDOP_TO_METERS: f64 = 5.0;

/// Runs a recorded track through the live engine as if it were arriving in
/// real time: elapsed time is ticked up to each point's offset from the
/// first timestamp before the point is fed as a fix.
pub fn replay(
    parsed: &ParsedActivity,
    mut workout: WorkoutConfig,
    tracking: &TrackingConfig,
) -> Result<SessionSnapshot, ReplayError> {
    let start = parsed
        .points
        .iter()
        .find_map(|point| point.time)
        .ok_or(ReplayError::MissingTimestamps)?;

    let span_seconds = parsed
        .points
        .iter()
        .filter_map(|point| point.time)
        .map(|time| (time - start).num_seconds().max(0) as u64)
        .max()
        .unwrap_or(0);
    let limit_seconds = tracking.replay_max_span.as_secs();
    if span_seconds > limit_seconds {
        return Err(ReplayError::SpanTooLong {
            span_seconds,
            limit_seconds,
        });
    }

    workout.mode = TrackingMode::Outdoor;
    let mut session = TrackingSession::new(Uuid::new_v4(), workout, tracking);
    session.start()?;

    let mut fed = 0usize;
    for point in &parsed.points {
        let Some(fix) = fix_from_point(point) else {
            continue;
        };

        let offset = (fix.timestamp - start).num_seconds().max(0) as u64;
        session.advance_to(offset);

        session.ingest_fix(fix);
        if point.heart_rate.is_some() {
            session.record_heart_rate(point.heart_rate);
        }
        fed += 1;
    }

    tracing::info!(
        points = parsed.points.len(),
        fed,
        distance_km = session.total_distance_km(),
        "Replayed {} track",
        parsed.file_format.as_str()
    );

    Ok(session.finish()?)
}

/// Points without a timestamp cannot be placed in time and yield `None`.
pub fn fix_from_point(point: &TrackPoint) -> Option<Fix> {
    let timestamp = point.time?;
    let accuracy_m = point
        .hdop
        .filter(|hdop| hdop.is_finite() && *hdop > 0.0)
        .map(|hdop| hdop * HDOP_TO_METERS)
        .unwrap_or(DEFAULT_ACCURACY_M);

    Some(Fix {
        lat: point.lat,
        lon: point.lon,
        accuracy_m,
        timestamp,
        reported_speed_ms: point.speed_ms,
    })
}
