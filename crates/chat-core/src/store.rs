//! The message store trait.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::StoreError;
use crate::message::{NewMessage, OwnerId, StoredMessage};

/// Stream of rows pushed by the store after they are inserted.
pub type PushStream = BoxStream<'static, StoredMessage>;

/// Durable, owner-scoped table of chat messages.
///
/// Implementations must be safe to share between tasks; the controller
/// holds one behind an `Arc`.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// All rows for `owner`, ascending by `created_at`.
    async fn select(&self, owner: &OwnerId) -> Result<Vec<StoredMessage>, StoreError>;

    /// Persist a row and return it with its durable id.
    async fn insert(&self, row: NewMessage) -> Result<StoredMessage, StoreError>;

    /// Delete every row for `owner`, returning how many were removed.
    async fn delete(&self, owner: &OwnerId) -> Result<u64, StoreError>;

    /// Subscribe to rows inserted for `owner` from now on.
    ///
    /// Delivery is at-least-once and may race with the insert call that
    /// produced the row.
    fn subscribe(&self, owner: &OwnerId) -> Result<PushStream, StoreError>;
}
