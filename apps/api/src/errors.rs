use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The session is in the wrong status for the requested operation
    /// (continue on a completed session, retake on an in-progress one).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Duplicate submission: the question already holds a graded answer.
    #[error("Already answered: {0}")]
    AlreadyAnswered(String),

    /// Retake requested on a session with no incorrect or unanswered items.
    #[error("Nothing to retake: {0}")]
    NothingToRetake(String),

    /// The grading collaborator failed or timed out. No state was written,
    /// so the same submission can be retried as-is.
    #[error("Grading unavailable: {0}")]
    GradingUnavailable(String),

    /// The question generator collaborator failed or returned a bad batch.
    #[error("Generator error: {0}")]
    Generator(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::InvalidState(msg) => (StatusCode::CONFLICT, "INVALID_STATE", msg.clone()),
            AppError::AlreadyAnswered(msg) => {
                (StatusCode::CONFLICT, "ALREADY_ANSWERED", msg.clone())
            }
            AppError::NothingToRetake(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NOTHING_TO_RETAKE",
                msg.clone(),
            ),
            AppError::GradingUnavailable(msg) => {
                tracing::error!("Grading unavailable: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "GRADING_UNAVAILABLE",
                    "Grading is temporarily unavailable. Your answer was not recorded — submit it again.".to_string(),
                )
            }
            AppError::Generator(msg) => {
                tracing::error!("Generator error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "GENERATOR_ERROR",
                    "Question generation failed".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
