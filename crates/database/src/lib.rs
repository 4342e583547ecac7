//! SQLite message store.
//!
//! This crate persists chat transcripts using SQLx with SQLite and pushes
//! every inserted row to in-process subscribers, which is how the
//! conversation controller learns about rows written by other writers
//! (e.g. the chatbot webhook) sharing the same store.
//!
//! # Example
//!
//! ```no_run
//! use chat_core::{MessageStore, NewMessage, OwnerId};
//! use database::ChatStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let store = ChatStore::connect("sqlite:chat.db?mode=rwc").await?;
//!     store.migrate().await?;
//!
//!     let owner = OwnerId::parse("c27fb365-0c84-4cf2-8555-814bb065e448").unwrap();
//!     let row = store.insert(NewMessage::user(owner.clone(), "hello")).await?;
//!     println!("stored {}", row.id);
//!
//!     Ok(())
//! }
//! ```

pub mod chat_message;
pub mod error;
pub mod models;

pub use error::{DatabaseError, Result};
pub use models::ChatMessageRow;

use std::str::FromStr;

use async_trait::async_trait;
use chat_core::{MessageStore, NewMessage, OwnerId, PushStream, StoreError, StoredMessage};
use futures::{future, StreamExt};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

/// Buffered pushes per subscriber before it starts lagging.
const PUSH_CAPACITY: usize = 256;

/// SQLite-backed message store with an in-process push channel.
#[derive(Debug, Clone)]
pub struct ChatStore {
    pool: SqlitePool,
    pushes: broadcast::Sender<StoredMessage>,
}

impl ChatStore {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 5;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let store = database::ChatStore::connect("sqlite:data/chat.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let store = database::ChatStore::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {} (pool size: {})", url, pool_size);

        let (pushes, _) = broadcast::channel(PUSH_CAPACITY);
        Ok(Self { pool, pushes })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Number of live push subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.pushes.receiver_count()
    }
}

#[async_trait]
impl MessageStore for ChatStore {
    async fn select(&self, owner: &OwnerId) -> std::result::Result<Vec<StoredMessage>, StoreError> {
        Ok(chat_message::list_messages(&self.pool, owner).await?)
    }

    async fn insert(&self, row: NewMessage) -> std::result::Result<StoredMessage, StoreError> {
        let stored = chat_message::insert_message(&self.pool, &row).await?;
        debug!(id = %stored.id, owner = %stored.owner, sender = %stored.sender, "Inserted chat message");

        // No subscribers is not an error.
        let _ = self.pushes.send(stored.clone());
        Ok(stored)
    }

    async fn delete(&self, owner: &OwnerId) -> std::result::Result<u64, StoreError> {
        let removed = chat_message::delete_for_owner(&self.pool, owner).await?;
        debug!(owner = %owner, removed, "Deleted chat messages");
        Ok(removed)
    }

    fn subscribe(&self, owner: &OwnerId) -> std::result::Result<PushStream, StoreError> {
        let owner = owner.clone();
        let stream = BroadcastStream::new(self.pushes.subscribe()).filter_map(move |item| {
            let row = match item {
                Ok(row) if row.owner == owner => Some(row),
                Ok(_) => None,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(owner = %owner, skipped, "Push subscriber lagged, rows dropped");
                    None
                }
            };
            future::ready(row)
        });
        Ok(stream.boxed())
    }
}
