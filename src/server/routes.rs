//! Router configuration for the webhook server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use crate::app::App;
use crate::config::WEBHOOK_PATH;

/// Create the router with all routes.
pub fn create_router(app: App) -> Router {
    Router::new()
        .route(WEBHOOK_PATH, post(handlers::update_post))
        .route("/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .with_state(app)
}
