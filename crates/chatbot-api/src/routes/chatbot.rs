//! The chatbot webhook.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chat_core::{NewMessage, OwnerId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Incoming reply request.
#[derive(Debug, Deserialize)]
pub struct ChatbotRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    /// Slot the caller opened for this reply; echoed as the bot row's client_ref.
    #[serde(default)]
    pub slot_id: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatbotResponse {
    pub reply: String,
}

/// The reply produced for `message`.
pub fn echo_reply(message: &str) -> String {
    format!("You said: {}", message)
}

/// Answer a message and write the answer to the store.
///
/// Store failures are logged and do not fail the request; the caller still
/// gets the reply in the response body. With user message storage enabled,
/// the user row is only written for requests without a `slot_id`.
pub async fn reply(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatbotRequest>, JsonRejection>,
) -> Result<Json<ChatbotResponse>> {
    let Json(req) = payload.map_err(|rejection| {
        debug!(error = %rejection, "Unreadable chatbot request body");
        ApiError::missing_fields()
    })?;

    let message = req
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(ApiError::missing_fields)?;
    let owner = req
        .user_id
        .and_then(OwnerId::parse)
        .ok_or_else(ApiError::missing_fields)?;

    info!(owner = %owner, has_contact = req.user_email.is_some(), "Chatbot request");

    let slot_id = req.slot_id.filter(|s| !s.is_empty());

    // A caller that names its slot persists its own user message.
    if state.store_user_message && slot_id.is_some() {
        debug!(owner = %owner, "Caller sent a slot id, not storing user message");
    } else if state.store_user_message {
        if let Err(e) = state
            .store
            .insert(NewMessage::user(owner.clone(), message.clone()))
            .await
        {
            warn!(owner = %owner, error = %e, "Failed to store user message");
        }
    }

    let reply = echo_reply(&message);

    let mut bot_row = NewMessage::bot(owner.clone(), reply.clone());
    if let Some(slot_id) = slot_id {
        bot_row = bot_row.with_client_ref(slot_id);
    }
    match state.store.insert(bot_row).await {
        Ok(stored) => debug!(owner = %owner, id = %stored.id, "Stored bot reply"),
        Err(e) => warn!(owner = %owner, error = %e, "Failed to store bot reply"),
    }

    Ok(Json(ChatbotResponse { reply }))
}
