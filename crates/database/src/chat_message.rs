//! Chat message persistence.

use chat_core::{NewMessage, OwnerId, StoredMessage};
use chrono::SubsecRound;
use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

use crate::models::{format_timestamp, ChatMessageRow};
use crate::{DatabaseError, Result};

/// Insert a message, assigning it a fresh durable id.
///
/// The timestamp is truncated to microseconds, the precision of the column.
pub async fn insert_message(pool: &SqlitePool, new: &NewMessage) -> Result<StoredMessage> {
    let id = Uuid::new_v4().to_string();
    let created_at = new.created_at.trunc_subsecs(6);

    sqlx::query(
        r#"
        INSERT INTO chat_messages (id, user_id, sender, message, client_ref, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(new.owner.as_str())
    .bind(new.sender.as_str())
    .bind(&new.content)
    .bind(new.client_ref.as_deref())
    .bind(format_timestamp(&created_at))
    .execute(pool)
    .await?;

    Ok(StoredMessage {
        id,
        owner: new.owner.clone(),
        sender: new.sender,
        content: new.content.clone(),
        created_at,
        client_ref: new.client_ref.clone(),
    })
}

/// List every message for an owner, oldest first.
///
/// Rows sharing a timestamp come back in insertion order. Rows that do not
/// decode are logged and left out.
pub async fn list_messages(pool: &SqlitePool, owner: &OwnerId) -> Result<Vec<StoredMessage>> {
    let rows = sqlx::query_as::<_, ChatMessageRow>(
        r#"
        SELECT id, user_id, sender, message, client_ref, created_at
        FROM chat_messages
        WHERE user_id = ?
        ORDER BY created_at ASC, rowid ASC
        "#,
    )
    .bind(owner.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| match StoredMessage::try_from(row) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(owner = %owner, error = %e, "Skipping unreadable chat message row");
                None
            }
        })
        .collect())
}

/// Fetch a single message by durable id.
pub async fn get_message(pool: &SqlitePool, id: &str) -> Result<StoredMessage> {
    let row = sqlx::query_as::<_, ChatMessageRow>(
        r#"
        SELECT id, user_id, sender, message, client_ref, created_at
        FROM chat_messages
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "chat message",
        id: id.to_string(),
    })?;

    StoredMessage::try_from(row)
}

/// Delete every message for an owner.
pub async fn delete_for_owner(pool: &SqlitePool, owner: &OwnerId) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM chat_messages
        WHERE user_id = ?
        "#,
    )
    .bind(owner.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Count messages for an owner.
pub async fn count_for_owner(pool: &SqlitePool, owner: &OwnerId) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM chat_messages WHERE user_id = ?
        "#,
    )
    .bind(owner.as_str())
    .fetch_one(pool)
    .await?;

    Ok(count)
}
