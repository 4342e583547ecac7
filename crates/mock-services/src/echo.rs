//! Echo and fixed reply implementations.

use chat_core::{async_trait, ReplyError, ReplyRequest, ReplyService};

/// A reply service that echoes the message back.
///
/// Useful for testing the message flow without any webhook.
#[derive(Debug, Clone, Default)]
pub struct EchoReply {
    /// Optional prefix to add before the echo.
    prefix: Option<String>,
}

impl EchoReply {
    /// Create a new EchoReply with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new EchoReply with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

#[async_trait]
impl ReplyService for EchoReply {
    async fn request_reply(&self, request: ReplyRequest) -> Result<String, ReplyError> {
        Ok(match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, request.content),
            None => request.content,
        })
    }

    fn name(&self) -> &str {
        "EchoReply"
    }
}

/// A reply service that always answers with the same text.
#[derive(Debug, Clone)]
pub struct FixedReply {
    text: String,
}

impl FixedReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl ReplyService for FixedReply {
    async fn request_reply(&self, _request: ReplyRequest) -> Result<String, ReplyError> {
        Ok(self.text.clone())
    }

    fn name(&self) -> &str {
        "FixedReply"
    }
}
