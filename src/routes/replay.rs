use axum::extract::Multipart;
use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;

use crate::error::{AppError, ReplayError};
use crate::pipeline::{parse, replay};
use crate::state::AppState;
use crate::types::activity::FileFormat;
use crate::types::session::{SessionSnapshot, TrackingMode, WorkoutConfig};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/replay", post(replay_upload))
}

#[derive(Serialize)]
struct ReplayResponse {
    file_type: String,
    points: usize,
    snapshot: SessionSnapshot,
}

/// Replays an uploaded GPX/FIT track through the tracking engine.
async fn replay_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ReplayResponse>, AppError> {
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            filename = field.file_name().map(|s| s.to_string());
            file_bytes = Some(field.bytes().await.map_err(|e| {
                AppError::BadRequest(format!("Failed to read file bytes: {}", e))
            })?.to_vec());
        }
    }

    let bytes = file_bytes.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;
    let filename = filename.ok_or_else(|| AppError::BadRequest("No filename provided".to_string()))?;

    let format = FileFormat::from_filename(&filename)
        .ok_or_else(|| AppError::BadRequest("Unsupported file format".to_string()))?;

    tracing::info!("Replaying {} file: {}", format.as_str(), filename);

    let tracking = state.config().tracking.clone();
    let (parsed, snapshot) = tokio::task::spawn_blocking(move || {
        let parsed = parse::parse(&bytes, format)?;
        let snapshot = replay::replay(
            &parsed,
            WorkoutConfig::new(TrackingMode::Outdoor, false),
            &tracking,
        )?;
        Ok::<_, AppError>((parsed, snapshot))
    })
    .await
    .map_err(|e| AppError::Replay(ReplayError::Aborted(e.to_string())))??;
    state.store().save(&snapshot)?;

    tracing::info!(
        "Replayed {} as session {} ({} points, {:.2} km)",
        filename,
        snapshot.session_id,
        parsed.points.len(),
        snapshot.total_distance_km
    );

    Ok(Json(ReplayResponse {
        file_type: format.as_str().to_string(),
        points: parsed.points.len(),
        snapshot,
    }))
}
