//! Reference chatbot webhook.
//!
//! `POST /api/chatbot` takes `{"message", "user_id", "slot_id"?}`, answers
//! with `{"reply": "You said: <message>"}` and writes that reply to the
//! message store as a bot row whose `client_ref` is the `slot_id`. A chat
//! client subscribed to the same store sees the row pushed and fills the
//! matching slot with it.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{Config, ConfigError};
pub use error::{ApiError, MISSING_FIELDS};
pub use routes::chatbot::echo_reply;
pub use state::AppState;

use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

/// Build the application with its state attached.
pub fn app(state: AppState) -> Router {
    routes::router().with_state(state)
}

/// Serve the chatbot API on an already bound listener until the task ends.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Chatbot API listening");
    }
    axum::serve(listener, app(state)).await
}
