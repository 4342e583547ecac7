//! Route handlers for the chatbot API.

pub mod chatbot;
pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/chatbot", post(chatbot::reply))
}
