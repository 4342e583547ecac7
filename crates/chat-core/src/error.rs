//! Error types for the message store and reply service.

use std::time::Duration;

use thiserror::Error;

/// Errors reported by a [`MessageStore`](crate::MessageStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A query or statement failed.
    #[error("store query failed: {0}")]
    Query(String),

    /// A row could not be decoded into a message.
    #[error("invalid row: {0}")]
    InvalidRow(String),

    /// The push channel could not be opened.
    #[error("subscribe failed: {0}")]
    Subscribe(String),
}

/// Errors reported by a [`ReplyService`](crate::ReplyService).
#[derive(Debug, Error)]
pub enum ReplyError {
    /// The request did not complete within the allotted time.
    #[error("reply timed out after {0:?}")]
    Timeout(Duration),

    /// The service answered with a non-success status.
    #[error("reply service returned HTTP {status}")]
    Status { status: u16, body: String },

    /// The request could not be delivered or the connection dropped.
    #[error("reply transport error: {0}")]
    Transport(String),

    /// The service answered successfully but no reply could be extracted.
    #[error("malformed reply: {0}")]
    Malformed(String),
}

impl ReplyError {
    /// Whether the error means the service could not be reached at all
    /// (as opposed to answering with something unusable).
    pub fn is_connectivity(&self) -> bool {
        !matches!(self, ReplyError::Malformed(_))
    }
}
