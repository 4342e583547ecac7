//! Persisting reply implementation - writes the reply to a message store.

use std::sync::Arc;

use chat_core::{async_trait, MessageStore, NewMessage, ReplyError, ReplyRequest, ReplyService};

/// A reply service that stores its reply as a bot row before answering,
/// tagging the row with the request's slot id.
///
/// Models a webhook with its own database access, whose row reaches the
/// controller through the store's push channel.
pub struct PersistingReply<R: ReplyService, S: MessageStore> {
    inner: R,
    store: Arc<S>,
}

impl<R: ReplyService, S: MessageStore> PersistingReply<R, S> {
    pub fn new(inner: R, store: Arc<S>) -> Self {
        Self { inner, store }
    }
}

#[async_trait]
impl<R: ReplyService, S: MessageStore> ReplyService for PersistingReply<R, S> {
    async fn request_reply(&self, request: ReplyRequest) -> Result<String, ReplyError> {
        let owner = request.owner.clone();
        let slot_ref = request.slot_ref.clone();
        let reply = self.inner.request_reply(request).await?;

        let mut row = NewMessage::bot(owner, reply.clone());
        if let Some(slot_ref) = slot_ref {
            row = row.with_client_ref(slot_ref);
        }
        self.store
            .insert(row)
            .await
            .map_err(|e| ReplyError::Status {
                status: 500,
                body: e.to_string(),
            })?;

        Ok(reply)
    }

    fn name(&self) -> &str {
        "PersistingReply"
    }
}
