//! Delayed reply implementation - wraps another service with artificial delay.

use std::time::Duration;

use chat_core::{async_trait, ReplyError, ReplyRequest, ReplyService};
use tokio::time::sleep;

/// A reply service that wraps another one and adds artificial delay.
///
/// Useful for testing timeout handling and simulating webhook latency.
pub struct DelayedReply<R: ReplyService> {
    inner: R,
    delay: Duration,
}

impl<R: ReplyService> DelayedReply<R> {
    /// Create a new DelayedReply wrapping the given service with the specified delay.
    pub fn new(inner: R, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Create a service with a delay in milliseconds.
    pub fn with_millis(inner: R, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }
}

#[async_trait]
impl<R: ReplyService> ReplyService for DelayedReply<R> {
    async fn request_reply(&self, request: ReplyRequest) -> Result<String, ReplyError> {
        sleep(self.delay).await;
        self.inner.request_reply(request).await
    }

    fn name(&self) -> &str {
        "DelayedReply"
    }
}
