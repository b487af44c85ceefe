use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

use super::handlers::{health, list_for_user, notify, preview_email, retry};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/", get(health))
        // Notification lifecycle
        .route("/notify", post(notify))
        .route("/retry/{id}", post(retry))
        .route("/notifications/{user_id}", get(list_for_user))
        // Template preview
        .route("/preview-email", post(preview_email))
}
