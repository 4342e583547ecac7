//! The conversation controller.

use std::sync::Arc;

use chat_core::{
    LocalId, Message, MessageStore, NewMessage, OwnerId, ReplyError, ReplyRequest, ReplyService,
    StoredMessage,
};
use chrono::Utc;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::ConversationConfig;
use crate::error::ConversationError;
use crate::transcript::{RemoteInsert, Resolution, SlotOutcome, Transcript};

/// What a completed [`Conversation::send`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// Local id of the user's message.
    pub user: LocalId,
    /// Local id of the bot slot opened for this send.
    pub slot: LocalId,
    /// The outcome derived from the reply service.
    pub resolution: Resolution,
    /// Whether that outcome reached the transcript.
    pub outcome: SlotOutcome,
}

/// Drives the send / reply / reconcile cycle for one conversation owner.
///
/// Cloning is cheap and every clone shares the same transcript, so a send
/// can run on its own task while pushes keep arriving on another. The
/// transcript lock is never held across an await on a collaborator.
pub struct Conversation<S: MessageStore, R: ReplyService> {
    store: Arc<S>,
    replies: Arc<R>,
    config: ConversationConfig,
    transcript: Arc<Mutex<Transcript>>,
}

impl<S: MessageStore, R: ReplyService> Clone for Conversation<S, R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            replies: self.replies.clone(),
            config: self.config.clone(),
            transcript: self.transcript.clone(),
        }
    }
}

impl<S: MessageStore + 'static, R: ReplyService + 'static> Conversation<S, R> {
    /// Create a controller with no active owner.
    pub fn new(store: Arc<S>, replies: Arc<R>, config: ConversationConfig) -> Self {
        Self {
            store,
            replies,
            config,
            transcript: Arc::new(Mutex::new(Transcript::new())),
        }
    }

    /// Create a controller with default configuration.
    pub fn with_defaults(store: Arc<S>, replies: Arc<R>) -> Self {
        Self::new(store, replies, ConversationConfig::default())
    }

    pub fn config(&self) -> &ConversationConfig {
        &self.config
    }

    /// Snapshot of the transcript, oldest first.
    pub async fn messages(&self) -> Vec<Message> {
        self.transcript.lock().await.messages().to_vec()
    }

    /// The owner whose history is loaded.
    pub async fn owner(&self) -> Option<OwnerId> {
        self.transcript.lock().await.owner().cloned()
    }

    /// Number of sends still waiting on the reply service.
    pub async fn pending_replies(&self) -> usize {
        self.transcript.lock().await.pending_slots()
    }

    /// Replace the transcript with `owner`'s stored history.
    ///
    /// This is also how the active owner is switched. A store failure leaves
    /// the transcript empty and is only logged. Returns the number of
    /// messages loaded.
    pub async fn load_history(&self, owner: &OwnerId) -> usize {
        let rows = match self.store.select(owner).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(owner = %owner, error = %e, "Failed to load chat history");
                Vec::new()
            }
        };

        let mut transcript = self.transcript.lock().await;
        transcript.reset(owner.clone(), rows);
        info!(owner = %owner, messages = transcript.len(), "Loaded chat history");
        transcript.len()
    }

    /// Drop the transcript and the active owner (sign-out).
    pub async fn close(&self) {
        self.transcript.lock().await.close();
    }

    /// Send `content` as `owner`.
    ///
    /// The user's message is visible as soon as this is called and is never
    /// removed, whatever happens to persistence or the reply. The reply slot
    /// is resolved the moment the reply service answers or times out; the
    /// returned future also waits for the user message insert to finish.
    pub async fn send(
        &self,
        owner: &OwnerId,
        content: &str,
    ) -> Result<SendReceipt, ConversationError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ConversationError::EmptyContent);
        }

        let now = Utc::now();
        let (user, slot) = {
            let mut transcript = self.transcript.lock().await;
            check_owner(&transcript, owner)?;
            if self.config.serialize_sends && transcript.pending_slots() > 0 {
                return Err(ConversationError::SendInFlight);
            }
            let user = transcript
                .push_user(content, now)
                .ok_or(ConversationError::NoActiveOwner)?;
            let slot = transcript
                .open_slot(self.config.placeholder_text.clone(), now)
                .ok_or(ConversationError::NoActiveOwner)?;
            (user, slot)
        };
        debug!(owner = %owner, %user, %slot, "Queued outgoing message");

        // The slot is resolved inside the reply branch, independent of the insert.
        let persisted = self.persist_user_message(owner, content, user, now);
        let replied = async {
            let resolution = self.request_reply(owner, content, slot).await;
            let outcome = self
                .transcript
                .lock()
                .await
                .resolve_slot(slot, resolution.clone());
            match outcome {
                SlotOutcome::Applied => {
                    debug!(%slot, status = ?resolution.status, "Resolved reply slot")
                }
                other => debug!(%slot, ?other, "Reply resolution not applied"),
            }
            (resolution, outcome)
        };
        let ((), (resolution, outcome)) = tokio::join!(persisted, replied);

        Ok(SendReceipt {
            user,
            slot,
            resolution,
            outcome,
        })
    }

    /// Reconcile a row pushed by the message store.
    pub async fn on_remote_insert(&self, row: StoredMessage) -> RemoteInsert {
        let id = row.id.clone();
        let result = self.transcript.lock().await.apply_remote(row);
        debug!(id = %id, ?result, "Applied pushed row");
        result
    }

    /// Delete `owner`'s stored messages, then empty the transcript.
    ///
    /// If the store delete fails the transcript is left as it was and the
    /// error is returned.
    pub async fn clear(&self, owner: &OwnerId) -> Result<u64, ConversationError> {
        check_owner(&*self.transcript.lock().await, owner)?;

        let removed = self.store.delete(owner).await.map_err(|e| {
            warn!(owner = %owner, error = %e, "Failed to clear chat history");
            ConversationError::Store(e)
        })?;

        self.transcript.lock().await.clear();
        info!(owner = %owner, removed, "Cleared chat history");
        Ok(removed)
    }

    /// Feed the store's pushes for the active owner into [`Self::on_remote_insert`]
    /// on a background task.
    ///
    /// Abort the returned handle when the owner changes or the session ends.
    pub async fn spawn_push_listener(&self) -> Result<JoinHandle<()>, ConversationError> {
        let owner = self.owner().await.ok_or(ConversationError::NoActiveOwner)?;
        let mut pushes = self.store.subscribe(&owner)?;
        let conversation = self.clone();

        info!(owner = %owner, "Listening for pushed messages");
        Ok(tokio::spawn(async move {
            while let Some(row) = pushes.next().await {
                conversation.on_remote_insert(row).await;
            }
            info!(owner = %owner, "Push stream ended");
        }))
    }

    async fn persist_user_message(
        &self,
        owner: &OwnerId,
        content: &str,
        local_id: LocalId,
        at: chrono::DateTime<Utc>,
    ) {
        let row = NewMessage::user(owner.clone(), content)
            .at(at)
            .with_client_ref(local_id.to_string());

        match self.store.insert(row).await {
            Ok(stored) => {
                let swapped = self
                    .transcript
                    .lock()
                    .await
                    .assign_durable(local_id, stored.id.clone());
                debug!(%local_id, id = %stored.id, swapped, "Persisted user message");
            }
            Err(e) => {
                warn!(%local_id, error = %e, "Failed to persist user message");
            }
        }
    }

    async fn request_reply(&self, owner: &OwnerId, content: &str, slot: LocalId) -> Resolution {
        let mut request = ReplyRequest::new(owner.clone(), content).with_slot_ref(slot.to_string());
        if let Some(contact) = &self.config.owner_contact {
            request = request.with_owner_contact(contact.clone());
        }

        let service = self.replies.name();
        match timeout(self.config.reply_timeout, self.replies.request_reply(request)).await {
            Ok(Ok(reply)) if !reply.trim().is_empty() => Resolution::confirmed(reply),
            Ok(Ok(_)) => {
                warn!(service, %slot, "Reply service returned an empty reply");
                Resolution::confirmed(self.config.fallback_text.clone())
            }
            Ok(Err(ReplyError::Malformed(detail))) => {
                warn!(service, %slot, detail = %detail, "Reply service returned an unusable body");
                Resolution::confirmed(self.config.fallback_text.clone())
            }
            Ok(Err(e)) => {
                warn!(service, %slot, error = %e, "Reply request failed");
                Resolution::failed(self.config.connectivity_error_text.clone())
            }
            Err(_) => {
                warn!(service, %slot, timeout = ?self.config.reply_timeout, "Reply request timed out");
                Resolution::failed(self.config.connectivity_error_text.clone())
            }
        }
    }
}

fn check_owner(transcript: &Transcript, owner: &OwnerId) -> Result<(), ConversationError> {
    match transcript.owner() {
        None => Err(ConversationError::NoActiveOwner),
        Some(active) if active != owner => Err(ConversationError::OwnerMismatch {
            active: active.clone(),
            requested: owner.clone(),
        }),
        Some(_) => Ok(()),
    }
}
