//! HTTP routes for the chat service.

mod chat;

use crate::state::AppState;
use axum::{routing::post, Router};
use tower_http::cors::CorsLayer;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/chat/query", post(chat::chat_query))
        // CORS open to any frontend
        .layer(CorsLayer::permissive())
        .with_state(state)
}
