//! HTTP endpoint handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::notification::{Notification, NotifyRequest};
use crate::server::AppState;

use super::models::{NotifyResponse, PreviewRequest, PreviewResponse, RetryResponse};

/// Health check
pub async fn health() -> &'static str {
    "Notifications relay is running"
}

/// Create a notification and attempt delivery where wired.
#[tracing::instrument(name = "http.notify", skip(state, request), fields(event = ?request.event))]
pub async fn notify(
    State(state): State<AppState>,
    Json(request): Json<NotifyRequest>,
) -> Result<Json<NotifyResponse>> {
    let outcome = state.relay.notify(request).await?;
    Ok(Json(NotifyResponse {
        status: "ok",
        id: outcome.id,
        sent: outcome.sent,
    }))
}

/// Re-attempt delivery for an existing record.
#[tracing::instrument(name = "http.retry", skip(state))]
pub async fn retry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RetryResponse>> {
    // An id that is not even a valid uuid cannot resolve to a record
    let id = Uuid::parse_str(&id).map_err(|_| AppError::NotFound("Not found".into()))?;

    state.relay.retry(id).await?;
    Ok(Json(RetryResponse {
        status: "ok",
        id,
        retried: true,
    }))
}

/// All notifications for a user, newest first.
#[tracing::instrument(name = "http.list_for_user", skip(state))]
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Notification>>> {
    let records = state.relay.list_for_user(&user_id).await?;
    Ok(Json(records))
}

/// Render a template without creating or sending anything.
#[tracing::instrument(name = "http.preview_email", skip(state, request))]
pub async fn preview_email(
    State(state): State<AppState>,
    Json(request): Json<PreviewRequest>,
) -> Json<PreviewResponse> {
    let user = request.user.unwrap_or_default();
    let data = request.data.unwrap_or(Value::Null);
    let preview = state
        .relay
        .preview(request.event.as_deref().unwrap_or(""), &user, &data);

    Json(PreviewResponse {
        event: request.event,
        preview,
    })
}
