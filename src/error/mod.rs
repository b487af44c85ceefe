use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Missing required input, rejected before any persistence
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    /// Operation not available for the record's channel
    #[error("{0}")]
    UnsupportedChannel(String),

    /// The provider rejected or was unreachable; the record was persisted
    /// and carries the failure, so the id is reported back to the caller.
    #[error("Delivery failed for {id}: {reason}")]
    Delivery { id: Uuid, reason: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body: `{"status":"error","error":...}` with the record id
/// included once a record exists for the failed request.
#[derive(Serialize)]
struct ErrorResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Uuid>,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, id, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, None, msg),
            AppError::UnsupportedChannel(msg) => (StatusCode::BAD_REQUEST, None, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, None, msg),
            AppError::Delivery { id, reason } => {
                (StatusCode::INTERNAL_SERVER_ERROR, Some(id), reason)
            }
            AppError::Config(e) => (StatusCode::INTERNAL_SERVER_ERROR, None, e.to_string()),
            AppError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, None, e.to_string()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, None, msg),
        };

        // Always log the detailed error server-side
        tracing::error!(
            status = %status.as_u16(),
            id = ?id,
            message = %message,
            "API error"
        );

        let body = ErrorResponse {
            status: "error",
            id,
            error: message,
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                AppError::Validation("Missing required fields".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::NotFound("Not found".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::UnsupportedChannel("Retry only supports email for now".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Delivery {
                    id: Uuid::new_v4(),
                    reason: "provider down".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            let response = err.into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
