//! In-memory message store.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chat_core::{
    async_trait, MessageStore, NewMessage, OwnerId, PushStream, StoreError, StoredMessage,
};
use futures::{future, StreamExt};
use tokio::sync::{broadcast, Mutex};
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

#[derive(Default)]
struct Failures {
    select: AtomicBool,
    insert: AtomicBool,
    delete: AtomicBool,
}

/// A [`MessageStore`] kept in memory.
///
/// Inserts are broadcast to subscribers like the SQLite store does. Tests
/// can also push rows that were never inserted (simulating another writer)
/// and switch individual operations into failure mode.
#[derive(Clone)]
pub struct MemoryStore {
    rows: Arc<Mutex<Vec<StoredMessage>>>,
    pushes: broadcast::Sender<StoredMessage>,
    failures: Arc<Failures>,
    push_on_insert: Arc<AtomicBool>,
    insert_delay_ms: Arc<AtomicU64>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (pushes, _) = broadcast::channel(256);
        Self {
            rows: Arc::new(Mutex::new(Vec::new())),
            pushes,
            failures: Arc::new(Failures::default()),
            push_on_insert: Arc::new(AtomicBool::new(true)),
            insert_delay_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Make `select` fail until turned off again.
    pub fn fail_select(&self, fail: bool) {
        self.failures.select.store(fail, Ordering::SeqCst);
    }

    /// Make `insert` fail until turned off again.
    pub fn fail_insert(&self, fail: bool) {
        self.failures.insert.store(fail, Ordering::SeqCst);
    }

    /// Make `delete` fail until turned off again.
    pub fn fail_delete(&self, fail: bool) {
        self.failures.delete.store(fail, Ordering::SeqCst);
    }

    /// Whether inserts are broadcast to subscribers (default true).
    pub fn set_push_on_insert(&self, push: bool) {
        self.push_on_insert.store(push, Ordering::SeqCst);
    }

    /// Make every `insert` sleep this long before it does anything.
    pub fn set_insert_delay(&self, delay: Duration) {
        self.insert_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Store a row without going through `insert` and without pushing it.
    pub async fn seed(&self, new: NewMessage) -> StoredMessage {
        let row = Self::materialize(new);
        self.rows.lock().await.push(row.clone());
        row
    }

    /// Broadcast a row to subscribers without storing it.
    pub fn push(&self, row: StoredMessage) {
        let _ = self.pushes.send(row);
    }

    /// Snapshot of every stored row.
    pub async fn rows(&self) -> Vec<StoredMessage> {
        self.rows.lock().await.clone()
    }

    fn materialize(new: NewMessage) -> StoredMessage {
        StoredMessage {
            id: Uuid::new_v4().to_string(),
            owner: new.owner,
            sender: new.sender,
            content: new.content,
            created_at: new.created_at,
            client_ref: new.client_ref,
        }
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn select(&self, owner: &OwnerId) -> Result<Vec<StoredMessage>, StoreError> {
        if self.failures.select.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("select disabled".to_string()));
        }
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .await
            .iter()
            .filter(|row| &row.owner == owner)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.created_at);
        Ok(rows)
    }

    async fn insert(&self, new: NewMessage) -> Result<StoredMessage, StoreError> {
        let delay = self.insert_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.failures.insert.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("insert disabled".to_string()));
        }
        let row = Self::materialize(new);
        self.rows.lock().await.push(row.clone());
        if self.push_on_insert.load(Ordering::SeqCst) {
            self.push(row.clone());
        }
        Ok(row)
    }

    async fn delete(&self, owner: &OwnerId) -> Result<u64, StoreError> {
        if self.failures.delete.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("delete disabled".to_string()));
        }
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|row| &row.owner != owner);
        Ok((before - rows.len()) as u64)
    }

    fn subscribe(&self, owner: &OwnerId) -> Result<PushStream, StoreError> {
        let owner = owner.clone();
        let stream = BroadcastStream::new(self.pushes.subscribe()).filter_map(move |item| {
            future::ready(item.ok().filter(|row| row.owner == owner))
        });
        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> OwnerId {
        OwnerId::parse("alice").unwrap()
    }

    #[tokio::test]
    async fn test_insert_select_delete() {
        let store = MemoryStore::new();
        store.insert(NewMessage::user(alice(), "one")).await.unwrap();
        store
            .insert(NewMessage::user(OwnerId::parse("bob").unwrap(), "two"))
            .await
            .unwrap();

        assert_eq!(store.select(&alice()).await.unwrap().len(), 1);
        assert_eq!(store.delete(&alice()).await.unwrap(), 1);
        assert_eq!(store.rows().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_switches() {
        let store = MemoryStore::new();
        store.fail_insert(true);
        assert!(store.insert(NewMessage::user(alice(), "x")).await.is_err());
        store.fail_insert(false);
        assert!(store.insert(NewMessage::user(alice(), "x")).await.is_ok());

        store.fail_delete(true);
        assert!(store.delete(&alice()).await.is_err());
        assert_eq!(store.rows().await.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_is_pushed() {
        let store = MemoryStore::new();
        let mut pushes = store.subscribe(&alice()).unwrap();
        let row = store.insert(NewMessage::bot(alice(), "hi")).await.unwrap();
        assert_eq!(pushes.next().await, Some(row));
    }
}
