// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The entry store was unreachable or rejected the request.
    #[error("Entry store error: {0}")]
    Store(String),

    #[error("Streak cannot be restored: {0}")]
    NotRestorable(String),

    /// Some days of a restoration batch were written and some were not.
    #[error("Streak restoration failed for {failed} of {attempted} days: {first_error}")]
    PartialRestore {
        attempted: usize,
        failed: usize,
        first_error: String,
    },

    #[error("No day selected")]
    NoActiveDay,

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotRestorable(msg) => {
                (StatusCode::CONFLICT, "not_restorable", Some(msg.clone()))
            }
            AppError::PartialRestore { .. } => {
                tracing::error!(error = %self, "Streak restoration partially failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "partial_restore",
                    Some(self.to_string()),
                )
            }
            AppError::NoActiveDay => (StatusCode::CONFLICT, "no_active_day", None),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Store(msg) => {
                tracing::error!(error = %msg, "Entry store error");
                (StatusCode::BAD_GATEWAY, "store_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers and services
pub type Result<T> = std::result::Result<T, AppError>;
