use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::SessionHandle;
use crate::error::AppError;
use crate::session::FixOutcome;
use crate::state::AppState;
use crate::types::fix::{Fix, SensorError};
use crate::types::session::{Lap, SessionSnapshot, SessionView, WorkoutConfig};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sessions", post(start_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/pause", post(pause))
        .route("/api/sessions/:id/resume", post(resume))
        .route("/api/sessions/:id/fixes", post(submit_fixes))
        .route("/api/sessions/:id/distance", post(submit_distance))
        .route("/api/sessions/:id/heart-rate", post(submit_heart_rate))
        .route("/api/sessions/:id/sensor-error", post(sensor_error))
        .route("/api/sessions/:id/finish", post(finish))
        .route("/api/snapshots/:id", get(get_snapshot))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FixBatch {
    One(Fix),
    Many(Vec<Fix>),
}

#[derive(Serialize)]
struct FixesResponse {
    accepted: usize,
    rejected: usize,
    ignored: usize,
    laps: Vec<Lap>,
    session: SessionView,
}

#[derive(Deserialize)]
struct DistanceRequest {
    km: f64,
}

#[derive(Serialize)]
struct DistanceResponse {
    laps: Vec<Lap>,
    session: SessionView,
}

#[derive(Deserialize)]
struct HeartRateRequest {
    bpm: Option<u16>,
}

#[derive(Serialize)]
struct HeartRateResponse {
    recorded: bool,
    session: SessionView,
}

#[derive(Deserialize)]
struct SensorErrorRequest {
    error: SensorError,
}

fn session(state: &AppState, id: Uuid) -> Result<SessionHandle, AppError> {
    state
        .get(id)
        .ok_or_else(|| AppError::NotFound(id.to_string()))
}

async fn start_session(
    State(state): State<AppState>,
    Json(workout): Json<WorkoutConfig>,
) -> Result<Json<SessionView>, AppError> {
    if let Some(km) = workout.target_distance_km {
        if !km.is_finite() || km <= 0.0 {
            return Err(AppError::BadRequest(format!("Invalid target distance: {}", km)));
        }
    }

    let handle = state.create_session(workout);
    handle.start().await?;

    tracing::info!("Created session {}", handle.id());
    Ok(Json(handle.view()))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(session(&state, id)?.view()))
}

async fn pause(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = session(&state, id)?;
    handle.pause().await?;
    Ok(Json(handle.view()))
}

async fn resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = session(&state, id)?;
    handle.resume().await?;
    Ok(Json(handle.view()))
}

async fn submit_fixes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(batch): Json<FixBatch>,
) -> Result<Json<FixesResponse>, AppError> {
    let handle = session(&state, id)?;
    let fixes = match batch {
        FixBatch::One(fix) => vec![fix],
        FixBatch::Many(fixes) => fixes,
    };

    let mut response = FixesResponse {
        accepted: 0,
        rejected: 0,
        ignored: 0,
        laps: Vec::new(),
        session: handle.view(),
    };

    for fix in fixes {
        match handle.submit_fix(fix).await? {
            FixOutcome::Ignored => response.ignored += 1,
            FixOutcome::Processed { decision, laps } => {
                if decision.accepted {
                    response.accepted += 1;
                } else {
                    response.rejected += 1;
                }
                response.laps.extend(laps);
            }
        }
    }

    response.session = handle.view();
    Ok(Json(response))
}

async fn submit_distance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DistanceRequest>,
) -> Result<Json<DistanceResponse>, AppError> {
    let handle = session(&state, id)?;
    let laps = handle.submit_manual_distance_increment(request.km).await?;
    Ok(Json(DistanceResponse {
        laps,
        session: handle.view(),
    }))
}

async fn submit_heart_rate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<HeartRateRequest>,
) -> Result<Json<HeartRateResponse>, AppError> {
    let handle = session(&state, id)?;
    let recorded = handle.record_heart_rate(request.bpm).await?;
    Ok(Json(HeartRateResponse {
        recorded,
        session: handle.view(),
    }))
}

async fn sensor_error(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SensorErrorRequest>,
) -> Result<Json<SessionView>, AppError> {
    let handle = session(&state, id)?;
    handle.report_sensor_error(request.error).await?;
    Ok(Json(handle.view()))
}

async fn finish(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let handle = session(&state, id)?;
    let snapshot = handle.finish().await?;
    state.mark_finished(id);
    Ok(Json(snapshot))
}

async fn get_snapshot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let snapshot = state
        .store()
        .load(id)?
        .ok_or_else(|| AppError::NotFound(id.to_string()))?;
    Ok(Json(snapshot))
}
