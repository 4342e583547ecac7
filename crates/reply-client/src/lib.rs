//! Reply webhook client library.
//!
//! This crate provides the HTTP implementation of
//! [`ReplyService`](chat_core::ReplyService). It:
//!
//! - POSTs the outgoing message as JSON to a workflow webhook
//! - Accepts several response envelopes (see [`shapes`])
//! - Maps non-success statuses, transport failures and unusable bodies to
//!   distinct [`ReplyError`](chat_core::ReplyError) variants
//!
//! # Example
//!
//! ```no_run
//! use chat_core::{OwnerId, ReplyRequest, ReplyService};
//! use reply_client::{WebhookClient, WebhookConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = WebhookClient::new(WebhookConfig::new("http://localhost:5678/webhook/chat"))?;
//! let owner = OwnerId::parse("alice").unwrap();
//! let reply = client.request_reply(ReplyRequest::new(owner, "hello")).await?;
//! println!("{reply}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod shapes;

pub use client::WebhookClient;
pub use config::{ConfigError, WebhookConfig, DEFAULT_TIMEOUT};
