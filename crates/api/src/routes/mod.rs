//! Route modules and the `/api/v1` router assembly.

pub mod comments;
pub mod health;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Assemble all `/api/v1` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/webhooks", webhooks::router())
        .nest("/comments", comments::router())
}
