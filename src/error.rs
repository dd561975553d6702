//! Error types for pulsecheck
//!
//! The intake service is the classification boundary: every failure on the
//! submit path is mapped to one of these variants before it reaches the
//! HTTP layer. `CooldownActive` is a structured rejection, not an
//! exceptional error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;

/// Common result type for pulsecheck operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed assessment input (wrong answer count, out-of-range values)
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Neither the request nor the stored identity resolves language + age group
    #[error("Identity profile incomplete: language and age group are required")]
    IncompleteProfile,

    /// One accepted submission per identity per calendar day
    #[error("Submission cooldown active until {next_eligible_at}")]
    CooldownActive { next_eligible_at: DateTime<Utc> },

    /// External AI collaborator unreachable, slow, or returned garbage.
    /// Callers degrade on this; it never fails a primary operation.
    #[error("External service unavailable: {0}")]
    ExternalUnavailable(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Cooldown carries structured payload beyond code/message
        if let Error::CooldownActive { next_eligible_at } = &self {
            let body = Json(json!({
                "error": {
                    "code": "SUBMISSION_COOLDOWN",
                    "message": self.to_string(),
                    "next_eligible_at": next_eligible_at,
                }
            }));
            return (StatusCode::CONFLICT, body).into_response();
        }

        let (status, code, message) = match &self {
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, "INVALID_RESPONSES", msg.clone()),
            Error::IncompleteProfile => (
                StatusCode::BAD_REQUEST,
                "INCOMPLETE_PROFILE",
                self.to_string(),
            ),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            Error::Config(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                msg.clone(),
            ),
            // Write-path persistence failures are retryable by the caller.
            Error::Database(_) | Error::Io(_) | Error::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SUBMISSION_FAILED",
                "Operation failed. Please try again.".to_string(),
            ),
            Error::ExternalUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "AI_UNAVAILABLE",
                msg.clone(),
            ),
            Error::CooldownActive { .. } => unreachable!("handled above"),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
