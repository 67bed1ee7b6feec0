use atleta_tracker::config::TrackingConfig;
use atleta_tracker::error::SessionError;
use atleta_tracker::session::{FixOutcome, TrackingSession};
use atleta_tracker::types::fix::{Fix, Rejection};
use atleta_tracker::types::session::{GpsStatus, SessionPhase, TrackingMode, WorkoutConfig};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

const BASE_LAT: f64 = 52.5200;
const BASE_LON: f64 = 13.4050;
const KM_PER_DEGREE_LAT: f64 = 6371.0 * std::f64::consts::PI / 180.0;

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_767_250_800, 0).expect("timestamp")
}

fn fix_at(km: f64, seconds: i64) -> Fix {
    Fix::new(
        BASE_LAT + km / KM_PER_DEGREE_LAT,
        BASE_LON,
        5.0,
        t0() + Duration::seconds(seconds),
    )
}

fn started(mode: TrackingMode) -> TrackingSession {
    let mut session = TrackingSession::new(
        Uuid::new_v4(),
        WorkoutConfig::new(mode, true),
        &TrackingConfig::default(),
    );
    assert_eq!(session.start(), Ok(true));
    session
}

fn tick_to(session: &mut TrackingSession, elapsed: u64) {
    while session.elapsed_seconds() < elapsed {
        assert!(session.tick());
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
}

#[test]
fn scenario_run_with_duplicate_fix() {
    let mut session = started(TrackingMode::Outdoor);

    assert!(session.ingest_fix(fix_at(0.0, 0)).laps().is_empty());

    tick_to(&mut session, 300);
    assert!(session.ingest_fix(fix_at(0.5, 300)).laps().is_empty());

    tick_to(&mut session, 600);
    let outcome = session.ingest_fix(fix_at(1.5, 600));
    assert_eq!(outcome.laps().len(), 1);
    assert_eq!(outcome.laps()[0].km, 1);
    assert_eq!(outcome.laps()[0].elapsed_seconds, 600);

    // Re-reported position a moment later: no distance, no second lap.
    tick_to(&mut session, 650);
    let outcome = session.ingest_fix(fix_at(1.502, 650));
    assert!(outcome.laps().is_empty());
    match outcome {
        FixOutcome::Processed { decision, .. } => {
            assert_eq!(decision.rejection, Some(Rejection::Jitter))
        }
        FixOutcome::Ignored => panic!("fix should have been processed"),
    }

    tick_to(&mut session, 900);
    let outcome = session.ingest_fix(fix_at(2.1, 900));
    assert_eq!(outcome.laps().len(), 1);
    assert_eq!(outcome.laps()[0].km, 2);

    assert_close(session.total_distance_km(), 2.1);
    assert_eq!(session.average_pace_string(), "7'09\"");
    assert_eq!(session.elapsed_seconds_formatted(), "15:00");

    let laps = session.laps();
    assert_eq!(laps.len(), 2);
    assert_eq!(laps[0].km, 1);
    assert_eq!(laps[0].elapsed_seconds, 600);
    assert_eq!(laps[0].pace_at_lap, "6'40\"");
    assert_eq!(laps[0].split_seconds, 600);
    assert_eq!(laps[1].km, 2);
    assert_eq!(laps[1].split_seconds, 300);
    assert_eq!(laps.iter().filter(|lap| lap.km == 1).count(), 1);

    // Baseline plus three accepted moves.
    assert_eq!(session.route().len(), 4);
}

#[test]
fn pause_freezes_time_and_distance_then_resumes_from_fresh_baseline() {
    let mut session = started(TrackingMode::Outdoor);
    session.ingest_fix(fix_at(0.0, 0));
    tick_to(&mut session, 60);
    session.ingest_fix(fix_at(0.2, 60));
    assert_close(session.total_distance_km(), 0.2);

    session.pause().expect("pause");
    assert_eq!(session.phase(), SessionPhase::Paused);
    for _ in 0..30 {
        assert!(!session.tick());
    }
    assert_eq!(session.elapsed_seconds(), 60);
    assert_eq!(session.ingest_fix(fix_at(0.5, 90)), FixOutcome::Ignored);
    assert_close(session.total_distance_km(), 0.2);
    assert_eq!(session.current_speed_kmh(), 0.0);

    session.resume().expect("resume");
    assert!(session.last_accepted_fix().is_none());

    // Far away and long after: only a new baseline.
    let outcome = session.ingest_fix(fix_at(0.8, 600));
    match outcome {
        FixOutcome::Processed { decision, .. } => {
            assert!(decision.accepted);
            assert_eq!(decision.distance_delta_km, 0.0);
        }
        FixOutcome::Ignored => panic!("fix should have been processed"),
    }
    assert_close(session.total_distance_km(), 0.2);

    tick_to(&mut session, 70);
    session.ingest_fix(fix_at(0.83, 610));
    assert_close(session.total_distance_km(), 0.23);
    assert_eq!(session.elapsed_seconds(), 70);
}

#[test]
fn treadmill_ignores_gps_and_counts_manual_distance() {
    let mut session = started(TrackingMode::Treadmill);
    assert_eq!(session.gps_status(), GpsStatus::NotUsed);

    for i in 0..20 {
        assert_eq!(session.ingest_fix(fix_at(i as f64 * 0.05, i * 10)), FixOutcome::Ignored);
    }
    assert_eq!(session.total_distance_km(), 0.0);
    assert!(session.route().is_empty());

    tick_to(&mut session, 240);
    assert!(session.submit_manual_distance_increment(0.5).expect("0.5 km").is_empty());
    let laps = session.submit_manual_distance_increment(0.7).expect("0.7 km");
    assert_eq!(laps.len(), 1);
    assert_eq!(laps[0].km, 1);
    assert_close(session.total_distance_km(), 1.2);
    assert_eq!(session.current_speed_kmh(), 0.0);
}

#[test]
fn manual_increment_validation() {
    let mut session = started(TrackingMode::Treadmill);
    assert_eq!(
        session.submit_manual_distance_increment(-0.5),
        Err(SessionError::InvalidIncrement(-0.5))
    );
    assert!(matches!(
        session.submit_manual_distance_increment(f64::NAN),
        Err(SessionError::InvalidIncrement(_))
    ));
    assert_eq!(session.total_distance_km(), 0.0);

    session.pause().expect("pause");
    assert_eq!(session.submit_manual_distance_increment(0.1), Err(SessionError::Paused));

    let mut outdoor = started(TrackingMode::Outdoor);
    assert_eq!(
        outdoor.submit_manual_distance_increment(0.1),
        Err(SessionError::NotTreadmill)
    );
}

#[test]
fn manual_jump_over_several_kilometers_records_each_lap() {
    let mut session = started(TrackingMode::Treadmill);
    tick_to(&mut session, 900);
    let laps = session.submit_manual_distance_increment(3.4).expect("3.4 km");
    assert_eq!(laps.iter().map(|lap| lap.km).collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn distance_never_decreases_and_each_kilometer_has_one_lap() {
    let mut session = started(TrackingMode::Outdoor);
    let mut previous_total = 0.0;
    let mut km = 0.0;
    let mut seconds = 0i64;

    for i in 0..2000u64 {
        seconds += 1 + (i % 3) as i64;
        tick_to(&mut session, seconds as u64);

        km += 0.004 + (i % 5) as f64 * 0.0015;
        let mut fix = fix_at(km + ((i as f64) * 1.7).sin() * 0.002, seconds);
        match i % 17 {
            3 => fix.accuracy_m = 80.0,
            7 => fix.lat += 0.05,
            11 => fix.timestamp = fix.timestamp - Duration::seconds(30),
            _ => {}
        }

        session.ingest_fix(fix);
        let total = session.total_distance_km();
        assert!(total >= previous_total, "distance went from {previous_total} to {total}");
        previous_total = total;
    }

    let whole_km = session.total_distance_km().floor() as u32;
    assert!(whole_km >= 2, "expected a few kilometers, got {}", session.total_distance_km());
    for n in 1..=whole_km {
        assert_eq!(session.laps().iter().filter(|lap| lap.km == n).count(), 1, "km {n}");
    }
    assert_eq!(session.laps().len(), whole_km as usize);
}

#[test]
fn low_accuracy_fix_changes_nothing() {
    let mut session = started(TrackingMode::Outdoor);
    session.ingest_fix(fix_at(0.0, 0));
    session.ingest_fix(fix_at(0.05, 10));
    let total = session.total_distance_km();
    let route_len = session.route().len();

    let mut fix = fix_at(0.1, 20);
    fix.accuracy_m = 51.0;
    session.ingest_fix(fix);

    assert_eq!(session.total_distance_km(), total);
    assert_eq!(session.route().len(), route_len);
}

#[test]
fn teleport_changes_neither_distance_nor_route() {
    let mut session = started(TrackingMode::Outdoor);
    session.ingest_fix(fix_at(0.0, 0));
    session.ingest_fix(fix_at(1.0, 1));
    assert_eq!(session.total_distance_km(), 0.0);
    assert_eq!(session.route().len(), 1);
    // The visible marker still follows the latest usable fix.
    assert_eq!(session.last_position(), Some(fix_at(1.0, 1).position()));
}

#[test]
fn slow_movement_accumulates_against_the_anchor() {
    let mut session = started(TrackingMode::Outdoor);
    session.ingest_fix(fix_at(0.0, 0));
    // 1.5 m steps are jitter on their own but add up from the anchor.
    for i in 1..=4 {
        session.ingest_fix(fix_at(0.0015 * i as f64, i));
    }
    assert_close(session.total_distance_km(), 0.0045);
}

#[test]
fn displayed_speed_decays_without_fixes() {
    let mut session = started(TrackingMode::Outdoor);
    session.ingest_fix(fix_at(0.0, 0).with_reported_speed(3.0));
    assert!((session.current_speed_kmh() - 10.8).abs() < 1e-9);

    tick_to(&mut session, 5);
    assert!((session.current_speed_kmh() - 10.8).abs() < 1e-9);
    tick_to(&mut session, 30);
    assert_eq!(session.current_speed_kmh(), 0.0);
}

#[test]
fn heart_rate_history_and_average() {
    let mut session = started(TrackingMode::Outdoor);
    assert!(session.record_heart_rate(Some(150)));
    assert!(session.record_heart_rate(Some(161)));
    assert!(!session.record_heart_rate(None));
    assert!(!session.record_heart_rate(Some(300)));
    assert_eq!(session.current_heart_rate(), Some(161));

    session.pause().expect("pause");
    assert!(!session.record_heart_rate(Some(120)));
    session.resume().expect("resume");

    assert_eq!(session.heart_rate_history(), &[150, 161]);
    let snapshot = session.finish().expect("finish");
    assert_eq!(snapshot.average_heart_rate, Some(156));
    assert_eq!(snapshot.max_heart_rate, Some(161));
}

#[test]
fn lifecycle_transitions() {
    let mut session = TrackingSession::new(
        Uuid::new_v4(),
        WorkoutConfig::new(TrackingMode::Outdoor, false),
        &TrackingConfig::default(),
    );
    assert_eq!(session.phase(), SessionPhase::Configuring);
    assert!(!session.tick());
    assert_eq!(session.pause(), Err(SessionError::NotStarted));
    assert!(matches!(session.finish(), Err(SessionError::NotStarted)));

    assert_eq!(session.start(), Ok(true));
    assert_eq!(session.start(), Ok(false));
    assert_eq!(session.resume(), Ok(()));
    session.pause().expect("pause");
    assert_eq!(session.pause(), Ok(()));
    assert_eq!(session.start(), Ok(false));
    assert_eq!(session.phase(), SessionPhase::Paused);
}

#[test]
fn finished_session_accepts_no_further_mutation() {
    let mut session = started(TrackingMode::Outdoor);
    session.ingest_fix(fix_at(0.0, 0));
    tick_to(&mut session, 120);
    session.ingest_fix(fix_at(0.3, 120));

    let snapshot = session.finish().expect("finish");
    assert_close(snapshot.total_distance_km, 0.3);
    assert_eq!(snapshot.elapsed_seconds, 120);
    assert_eq!(snapshot.pace, "6'40\"");
    assert_eq!(snapshot.route.len(), 2);
    assert!(snapshot.started_at.is_some());

    assert!(!session.tick());
    assert_eq!(session.ingest_fix(fix_at(0.6, 240)), FixOutcome::Ignored);
    assert!(!session.record_heart_rate(Some(140)));
    assert_eq!(session.pause(), Err(SessionError::Finished));
    assert_eq!(session.resume(), Err(SessionError::Finished));
    assert_eq!(session.start(), Err(SessionError::Finished));
    assert!(matches!(session.finish(), Err(SessionError::Finished)));
    assert_eq!(session.elapsed_seconds(), 120);
    assert_close(session.total_distance_km(), 0.3);
}

#[test]
fn gps_unavailable_degrades_without_failing() {
    let mut session = started(TrackingMode::Outdoor);
    assert_eq!(session.gps_status(), GpsStatus::Waiting);
    session.mark_gps_unavailable();
    assert_eq!(session.gps_status(), GpsStatus::Unavailable);
    assert!(session.tick());

    let view = session.view();
    assert_eq!(view.gps_status, GpsStatus::Unavailable);
    assert_eq!(view.total_distance_km, 0.0);
    assert_eq!(view.average_pace, "0'00\"");
}

#[test]
fn future_stamped_anchor_is_replaced_after_repeated_older_fixes() {
    let mut session = started(TrackingMode::Outdoor);
    session.ingest_fix(fix_at(0.0, 0));
    session.ingest_fix(fix_at(0.02, 10));
    // Good position, clock a day ahead: accepted and becomes the anchor.
    session.ingest_fix(fix_at(0.05, 10 + 86_400));
    let before = session.total_distance_km();

    let mut rejected_for_time = 0;
    for i in 1..=600i64 {
        let outcome = session.ingest_fix(fix_at(0.05 + 0.003 * i as f64, 10 + i));
        if let FixOutcome::Processed { decision, .. } = outcome {
            if decision.rejection == Some(Rejection::NonIncreasingTime) {
                rejected_for_time += 1;
            }
        }
    }

    assert_eq!(rejected_for_time, 2);
    let gained = session.total_distance_km() - before;
    assert!(gained > 1.7 && gained < 1.8, "gained {gained}");
    assert!(session.current_speed_kmh() > 10.0);
}

#[test]
fn isolated_older_fix_keeps_the_anchor() {
    let mut session = started(TrackingMode::Outdoor);
    session.ingest_fix(fix_at(0.0, 0));
    session.ingest_fix(fix_at(0.02, 10));
    let anchor = session.last_accepted_fix().cloned();

    session.ingest_fix(fix_at(0.03, 5));
    assert_eq!(session.last_accepted_fix().cloned(), anchor);

    session.ingest_fix(fix_at(0.04, 20));
    assert_close(session.total_distance_km(), 0.04);
}

#[test]
fn advance_to_jumps_elapsed_time_and_decays_speed() {
    let mut session = started(TrackingMode::Outdoor);
    session.ingest_fix(fix_at(0.0, 0).with_reported_speed(3.0));

    assert_eq!(session.advance_to(3), 3);
    assert!((session.current_speed_kmh() - 10.8).abs() < 1e-9);
    assert_eq!(session.advance_to(2), 0);

    assert_eq!(session.advance_to(4_000_000_000), 3_999_999_997);
    assert_eq!(session.elapsed_seconds(), 4_000_000_000);
    assert_eq!(session.current_speed_kmh(), 0.0);

    session.pause().expect("pause");
    assert_eq!(session.advance_to(4_000_000_100), 0);
    assert_eq!(session.elapsed_seconds(), 4_000_000_000);
}
