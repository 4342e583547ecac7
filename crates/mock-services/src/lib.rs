//! Mock collaborators for exercising the conversation controller.
//!
//! Reply services:
//! - `EchoReply` - Echoes the message back, optionally prefixed
//! - `FixedReply` - Always answers with the same text
//! - `FailingReply` - Always fails with a chosen error
//! - `DelayedReply` - Wraps another service with artificial latency
//! - `GatedReply` - Wraps another service and waits until released
//! - `PersistingReply` - Writes its reply to a store, like a webhook with
//!   its own database access
//!
//! Stores:
//! - `MemoryStore` - In-memory [`MessageStore`] with push support and
//!   switchable failures
//!
//! # Example
//!
//! ```rust
//! use mock_services::{EchoReply, OwnerId, ReplyRequest, ReplyService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_services::ReplyError> {
//!     let service = EchoReply::with_prefix("You said: ");
//!     let owner = OwnerId::parse("alice").unwrap();
//!
//!     let reply = service.request_reply(ReplyRequest::new(owner, "hi")).await?;
//!     assert_eq!(reply, "You said: hi");
//!     Ok(())
//! }
//! ```

mod delayed;
mod echo;
mod failing;
mod gated;
mod memory_store;
mod persisting;

// Re-export chat-core types for convenience
pub use chat_core::{
    async_trait, MessageStore, NewMessage, OwnerId, ReplyError, ReplyRequest, ReplyService,
    Sender, StoreError, StoredMessage,
};

pub use delayed::DelayedReply;
pub use echo::{EchoReply, FixedReply};
pub use failing::FailingReply;
pub use gated::GatedReply;
pub use memory_store::MemoryStore;
pub use persisting::PersistingReply;
