use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid GPX: {0}")]
    InvalidGpx(String),
    #[error("Invalid FIT: {0}")]
    InvalidFit(String),
    #[error("No track points found in file")]
    EmptyFile,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SessionError {
    #[error("Session has not been started")]
    NotStarted,
    #[error("Session is paused")]
    Paused,
    #[error("Session is already finished")]
    Finished,
    #[error("Manual distance is only accepted in treadmill mode")]
    NotTreadmill,
    #[error("Invalid distance increment: {0}")]
    InvalidIncrement(f64),
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("Failed to write snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Track has no timestamps; cannot derive elapsed time")]
    MissingTimestamps,
    #[error("Track spans {span_seconds} s, more than the {limit_seconds} s replay limit")]
    SpanTooLong { span_seconds: u64, limit_seconds: u64 },
    #[error("Replay task failed: {0}")]
    Aborted(String),
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error(transparent)]
    Replay(#[from] ReplayError),
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Replay(ReplayError::Aborted(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Parse(_) | AppError::Replay(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Session(SessionError::InvalidIncrement(_)) => StatusCode::BAD_REQUEST,
            AppError::Session(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Persist(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
