//! Core types and collaborator traits for the chat workspace.
//!
//! This crate provides the shared interface between the conversation
//! controller and the systems it talks to. It defines:
//!
//! - [`Message`] / [`MessageId`] / [`LocalId`] - The in-memory transcript entry
//! - [`StoredMessage`] / [`NewMessage`] - Durable rows in the message store
//! - [`MessageStore`] - The trait a persistence backend must implement
//! - [`ReplyService`] / [`ReplyRequest`] - The trait for reply generation
//! - [`StoreError`] / [`ReplyError`] - Error types for both collaborators
//!
//! # Example
//!
//! ```rust
//! use chat_core::{async_trait, ReplyError, ReplyRequest, ReplyService};
//!
//! struct Shout;
//!
//! #[async_trait]
//! impl ReplyService for Shout {
//!     async fn request_reply(&self, request: ReplyRequest) -> Result<String, ReplyError> {
//!         Ok(request.content.to_uppercase())
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Shout"
//!     }
//! }
//! ```

mod error;
mod message;
mod reply;
mod store;

pub use error::{ReplyError, StoreError};
pub use message::{
    LocalId, Message, MessageId, MessageStatus, NewMessage, OwnerId, Sender, StoredMessage,
};
pub use reply::{ReplyRequest, ReplyService};
pub use store::{MessageStore, PushStream};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
