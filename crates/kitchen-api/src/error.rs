//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kitchen_core::access::Actor;
use kitchen_core::error::DomainError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),

    /// Tracing or OpenTelemetry setup failed.
    #[error("telemetry error: {0}")]
    Telemetry(String),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `DomainError` that implements `IntoResponse`.
///
/// `anonymous` records whether the request carried no session, which turns
/// an authorization failure into 401 instead of 403.
#[derive(Debug)]
pub struct ApiError {
    /// The underlying domain error.
    pub error: DomainError,
    /// True when the caller had no session.
    pub anonymous: bool,
}

impl ApiError {
    /// Error mapper that remembers whether `actor` is signed in.
    pub fn for_actor(actor: &Actor) -> impl FnOnce(DomainError) -> Self + use<> {
        let anonymous = !actor.is_authenticated();
        move |error| Self { error, anonymous }
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        Self {
            error,
            anonymous: false,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.error {
            DomainError::AggregateNotFound(_) => (StatusCode::NOT_FOUND, "aggregate_not_found"),
            DomainError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            DomainError::Unauthorized(_) if self.anonymous => {
                (StatusCode::UNAUTHORIZED, "unauthenticated")
            }
            DomainError::Unauthorized(_) => (StatusCode::FORBIDDEN, "forbidden"),
            DomainError::ConcurrencyConflict { .. } => {
                (StatusCode::CONFLICT, "concurrency_conflict")
            }
            DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            DomainError::Upload(_) => (StatusCode::BAD_GATEWAY, "upload_error"),
            DomainError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
            }
        };

        let body = ErrorBody {
            error: error_code,
            message: self.error.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
