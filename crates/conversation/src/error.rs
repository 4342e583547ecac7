//! Error types for conversation operations.

use chat_core::{OwnerId, StoreError};
use thiserror::Error;

/// Errors surfaced to the caller of a conversation operation.
///
/// Reply failures are not here: they end up as a failed bot message in the
/// transcript instead.
#[derive(Debug, Error)]
pub enum ConversationError {
    /// The message was empty after trimming.
    #[error("message is empty")]
    EmptyContent,

    /// No history has been loaded, so there is no owner to send as.
    #[error("no active conversation owner")]
    NoActiveOwner,

    /// The operation named a different owner than the loaded conversation.
    #[error("conversation belongs to {active}, not {requested}")]
    OwnerMismatch { active: OwnerId, requested: OwnerId },

    /// Sends are serialized and a reply is still pending.
    #[error("a reply is still pending")]
    SendInFlight,

    /// The message store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
