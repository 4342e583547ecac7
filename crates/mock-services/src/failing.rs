//! Failing reply implementation.

use std::time::Duration;

use chat_core::{async_trait, ReplyError, ReplyRequest, ReplyService};

#[derive(Debug, Clone, Copy)]
enum FailureKind {
    Status(u16),
    Transport,
    Malformed,
    Timeout,
}

/// A reply service that fails every request the same way.
#[derive(Debug, Clone)]
pub struct FailingReply {
    kind: FailureKind,
}

impl FailingReply {
    /// Fail with a non-success HTTP status.
    pub fn status(status: u16) -> Self {
        Self {
            kind: FailureKind::Status(status),
        }
    }

    /// Fail as if the connection was refused.
    pub fn transport() -> Self {
        Self {
            kind: FailureKind::Transport,
        }
    }

    /// Answer successfully but without a usable reply field.
    pub fn malformed() -> Self {
        Self {
            kind: FailureKind::Malformed,
        }
    }

    /// Report a service-side timeout.
    pub fn timeout() -> Self {
        Self {
            kind: FailureKind::Timeout,
        }
    }
}

#[async_trait]
impl ReplyService for FailingReply {
    async fn request_reply(&self, _request: ReplyRequest) -> Result<String, ReplyError> {
        Err(match self.kind {
            FailureKind::Status(status) => ReplyError::Status {
                status,
                body: String::new(),
            },
            FailureKind::Transport => ReplyError::Transport("connection refused".to_string()),
            FailureKind::Malformed => ReplyError::Malformed("{}".to_string()),
            FailureKind::Timeout => ReplyError::Timeout(Duration::from_secs(8)),
        })
    }

    fn name(&self) -> &str {
        "FailingReply"
    }
}
