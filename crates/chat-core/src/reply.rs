//! The reply service trait.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ReplyError;
use crate::message::OwnerId;

/// A request for a reply to one outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyRequest {
    /// The text the user sent.
    #[serde(rename = "message")]
    pub content: String,
    /// Conversation owner.
    #[serde(rename = "user_id")]
    pub owner: OwnerId,
    /// Contact address of the owner, if the deployment shares one.
    #[serde(rename = "user_email", skip_serializing_if = "Option::is_none")]
    pub owner_contact: Option<String>,
    /// Local id of the pending slot, echoed back by services that persist
    /// their reply to the message store.
    #[serde(rename = "slot_id", skip_serializing_if = "Option::is_none")]
    pub slot_ref: Option<String>,
}

impl ReplyRequest {
    pub fn new(owner: OwnerId, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            owner,
            owner_contact: None,
            slot_ref: None,
        }
    }

    pub fn with_slot_ref(mut self, slot_ref: impl Into<String>) -> Self {
        self.slot_ref = Some(slot_ref.into());
        self
    }

    pub fn with_owner_contact(mut self, contact: impl Into<String>) -> Self {
        self.owner_contact = Some(contact.into());
        self
    }
}

/// Something that turns an outgoing message into a reply.
///
/// This trait is object-safe and can be used with `Arc<dyn ReplyService>`.
#[async_trait]
pub trait ReplyService: Send + Sync {
    /// Ask for a reply. Latency is unbounded; callers apply their own timeout.
    async fn request_reply(&self, request: ReplyRequest) -> Result<String, ReplyError>;

    /// Get a human-readable name for this service.
    fn name(&self) -> &str;
}
