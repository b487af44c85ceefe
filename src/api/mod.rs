//! API layer - HTTP endpoint handlers and wire models.

mod handlers;
mod models;
mod routes;

pub use handlers::{health, list_for_user, notify, preview_email, retry};
pub use models::{NotifyResponse, PreviewRequest, PreviewResponse, RetryResponse};
pub use routes::api_routes;
