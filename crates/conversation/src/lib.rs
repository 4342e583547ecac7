//! Conversation controller for a chat backed by a message store and a
//! reply service.
//!
//! A send shows the user's message at once, opens a pending bot slot, then
//! persists the message and asks the reply service concurrently. The slot is
//! resolved from the reply, or from a row the store pushes for it, whichever
//! is authoritative:
//!
//! - a pushed row always wins over the local resolution, in either order,
//!   including a timed out or failed one
//! - the user's own message is never rolled back
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use conversation::Conversation;
//! use mock_services::{EchoReply, MemoryStore, OwnerId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), conversation::ConversationError> {
//!     let store = Arc::new(MemoryStore::new());
//!     let replies = Arc::new(EchoReply::with_prefix("You said: "));
//!     let chat = Conversation::with_defaults(store, replies);
//!
//!     let owner = OwnerId::parse("alice").unwrap();
//!     chat.load_history(&owner).await;
//!     chat.send(&owner, "hello").await?;
//!
//!     for message in chat.messages().await {
//!         println!("{}: {}", message.sender, message.content);
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod controller;
mod error;
pub mod transcript;

pub use config::{
    ConversationConfig, DEFAULT_CONNECTIVITY_ERROR, DEFAULT_FALLBACK, DEFAULT_PLACEHOLDER,
    DEFAULT_REPLY_TIMEOUT,
};
pub use controller::{Conversation, SendReceipt};
pub use error::ConversationError;
pub use transcript::{RemoteInsert, Resolution, SlotOutcome, SlotState, Transcript};
