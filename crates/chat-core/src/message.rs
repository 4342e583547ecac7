//! Message types shared by the controller and its collaborators.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Identity of the user a conversation belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Parse an owner id, rejecting empty or whitespace-only input.
    pub fn parse(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side of the conversation wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The local party (the person typing).
    User,
    /// The remote party (the reply service).
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sender {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Sender::User),
            "bot" => Ok(Sender::Bot),
            other => Err(StoreError::InvalidRow(format!("unknown sender: {other}"))),
        }
    }
}

/// Lifecycle state of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Waiting on the reply service (the "thinking" placeholder).
    Pending,
    /// Content is final, either optimistically or from the store.
    Confirmed,
    /// The reply could not be obtained. Terminal.
    Failed,
}

/// Client-side identifier handed out when a message first enters the transcript.
///
/// Only unique within one transcript; never sent to the store as a primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(pub u64);

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "local-{}", self.0)
    }
}

impl FromStr for LocalId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("local-")
            .and_then(|n| n.parse().ok())
            .map(LocalId)
            .ok_or(())
    }
}

/// The authoritative identity of a transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageId {
    /// Not yet persisted.
    Local(LocalId),
    /// Assigned by the message store.
    Durable(String),
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Local(id) => id.fmt(f),
            MessageId::Durable(id) => f.write_str(id),
        }
    }
}

/// A durable chat row as held by the message store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Durable id assigned by the store.
    pub id: String,
    /// Conversation owner.
    pub owner: OwnerId,
    /// Who wrote it.
    pub sender: Sender,
    /// Text payload.
    pub content: String,
    /// Ordering key.
    pub created_at: DateTime<Utc>,
    /// Local id of the message or pending slot this row answers, if the
    /// writer knew it.
    pub client_ref: Option<String>,
}

/// A row to be inserted; the store assigns the durable id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub owner: OwnerId,
    pub sender: Sender,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub client_ref: Option<String>,
}

impl NewMessage {
    /// A user-authored row stamped with the current time.
    pub fn user(owner: OwnerId, content: impl Into<String>) -> Self {
        Self {
            owner,
            sender: Sender::User,
            content: content.into(),
            created_at: Utc::now(),
            client_ref: None,
        }
    }

    /// A bot-authored row stamped with the current time.
    pub fn bot(owner: OwnerId, content: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            ..Self::user(owner, content)
        }
    }

    /// Attach the local id this row answers.
    pub fn with_client_ref(mut self, client_ref: impl Into<String>) -> Self {
        self.client_ref = Some(client_ref.into());
        self
    }

    /// Override the creation timestamp.
    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// An entry of the in-memory transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Identifier handed out at optimistic-insert time. Kept after
    /// persistence so pending slots can still be addressed.
    pub local_id: LocalId,
    /// Identifier assigned by the store, once known.
    pub durable_id: Option<String>,
    pub owner: OwnerId,
    pub sender: Sender,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub status: MessageStatus,
}

impl Message {
    /// The identity used for de-duplication.
    pub fn id(&self) -> MessageId {
        match &self.durable_id {
            Some(id) => MessageId::Durable(id.clone()),
            None => MessageId::Local(self.local_id),
        }
    }

    /// Build a confirmed entry from a durable row.
    pub fn from_stored(local_id: LocalId, row: StoredMessage) -> Self {
        Self {
            local_id,
            durable_id: Some(row.id),
            owner: row.owner,
            sender: row.sender,
            content: row.content,
            created_at: row.created_at,
            status: MessageStatus::Confirmed,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == MessageStatus::Pending
    }
}
