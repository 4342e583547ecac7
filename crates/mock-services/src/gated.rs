//! Gated reply implementation - holds requests until the test releases them.

use std::sync::Arc;

use chat_core::{async_trait, ReplyError, ReplyRequest, ReplyService};
use tokio::sync::{Notify, Semaphore};

/// A reply service that parks every request until [`GatedReply::release`]
/// is called, then delegates to the wrapped service.
///
/// Lets tests order a reply against other events (e.g. store pushes).
pub struct GatedReply<R: ReplyService> {
    inner: R,
    gate: Arc<Semaphore>,
    arrived: Arc<Notify>,
}

impl<R: ReplyService> GatedReply<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            gate: Arc::new(Semaphore::new(0)),
            arrived: Arc::new(Notify::new()),
        }
    }

    /// Let one parked (or future) request through.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    /// Wait until a request has reached the gate.
    pub async fn wait_for_request(&self) {
        self.arrived.notified().await;
    }
}

#[async_trait]
impl<R: ReplyService> ReplyService for GatedReply<R> {
    async fn request_reply(&self, request: ReplyRequest) -> Result<String, ReplyError> {
        self.arrived.notify_one();
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| ReplyError::Transport("gate closed".to_string()))?;
        permit.forget();
        self.inner.request_reply(request).await
    }

    fn name(&self) -> &str {
        "GatedReply"
    }
}
