//! Database models.

use chat_core::{OwnerId, Sender, StoredMessage};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::DatabaseError;

/// A raw `chat_messages` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ChatMessageRow {
    /// Durable id (UUID v4).
    pub id: String,
    /// Conversation owner.
    pub user_id: String,
    /// "user" or "bot".
    pub sender: String,
    /// Text payload.
    pub message: String,
    /// Local id echoed by the writer, if any.
    pub client_ref: Option<String>,
    /// RFC 3339 timestamp with microseconds, always UTC.
    pub created_at: String,
}

/// Format a timestamp so lexical order in SQLite matches time order.
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl TryFrom<ChatMessageRow> for StoredMessage {
    type Error = DatabaseError;

    fn try_from(row: ChatMessageRow) -> Result<Self, Self::Error> {
        let invalid = |column: &'static str, reason: String| DatabaseError::InvalidRow {
            id: row.id.clone(),
            column,
            reason,
        };

        let owner = OwnerId::parse(row.user_id.clone())
            .ok_or_else(|| invalid("user_id", "empty owner".to_string()))?;
        let sender = row
            .sender
            .parse::<Sender>()
            .map_err(|e| invalid("sender", e.to_string()))?;
        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| invalid("created_at", e.to_string()))?
            .with_timezone(&Utc);

        Ok(StoredMessage {
            id: row.id,
            owner,
            sender,
            content: row.message,
            created_at,
            client_ref: row.client_ref,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(sender: &str, created_at: &str) -> ChatMessageRow {
        ChatMessageRow {
            id: "r1".to_string(),
            user_id: "alice".to_string(),
            sender: sender.to_string(),
            message: "hi".to_string(),
            client_ref: Some("local-1".to_string()),
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn test_timestamp_format_is_fixed_width() {
        let a = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_timestamp(&a), "2025-01-02T03:04:05.000000Z");
    }

    #[test]
    fn test_row_decodes() {
        let stored = StoredMessage::try_from(row("bot", "2025-01-02T03:04:05.000000Z")).unwrap();
        assert_eq!(stored.sender, Sender::Bot);
        assert_eq!(stored.owner.as_str(), "alice");
        assert_eq!(stored.client_ref.as_deref(), Some("local-1"));
    }

    #[test]
    fn test_row_rejects_unknown_sender() {
        let err = StoredMessage::try_from(row("system", "2025-01-02T03:04:05Z")).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidRow { column: "sender", .. }));
    }

    #[test]
    fn test_row_rejects_bad_timestamp() {
        let err = StoredMessage::try_from(row("user", "yesterday")).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidRow { column: "created_at", .. }));
    }
}
