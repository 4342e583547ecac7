//! Configuration for the conversation controller.

use std::env;
use std::time::Duration;

/// Default bound on a reply request (8 seconds).
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(8);

/// Text shown in the bot slot while a reply is outstanding.
pub const DEFAULT_PLACEHOLDER: &str = "Thinking...";

/// Text shown when the reply service answered without a usable reply.
pub const DEFAULT_FALLBACK: &str = "I'm not sure how to respond to that.";

/// Text shown when the reply service could not be reached in time.
pub const DEFAULT_CONNECTIVITY_ERROR: &str =
    "Sorry, I couldn't reach the assistant. Please try again.";

/// Configuration for [`Conversation`](crate::Conversation).
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    /// Bound on each reply request. The request is dropped when it expires.
    pub reply_timeout: Duration,

    /// Reject a send while another reply is still pending.
    /// Default: false (concurrent sends each get their own slot).
    pub serialize_sends: bool,

    /// Placeholder content for pending bot slots.
    pub placeholder_text: String,

    /// Content used when the reply could not be parsed.
    pub fallback_text: String,

    /// Content used when the reply service failed or timed out.
    pub connectivity_error_text: String,

    /// Contact address forwarded with reply requests.
    pub owner_contact: Option<String>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
            serialize_sends: false,
            placeholder_text: DEFAULT_PLACEHOLDER.to_string(),
            fallback_text: DEFAULT_FALLBACK.to_string(),
            connectivity_error_text: DEFAULT_CONNECTIVITY_ERROR.to_string(),
            owner_contact: None,
        }
    }
}

impl ConversationConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `CHAT_REPLY_TIMEOUT_MS` - Reply timeout in milliseconds (default: 8000)
    /// - `CHAT_SERIALIZE_SENDS` - Reject sends while a reply is pending (default: false)
    /// - `CHAT_PLACEHOLDER_TEXT` - Pending slot text (default: "Thinking...")
    /// - `CHAT_OWNER_CONTACT` - Contact forwarded to the reply service
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let reply_timeout = env::var("CHAT_REPLY_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|ms: &u64| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.reply_timeout);

        let serialize_sends = env::var("CHAT_SERIALIZE_SENDS")
            .ok()
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(defaults.serialize_sends);

        let placeholder_text = env::var("CHAT_PLACEHOLDER_TEXT")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.placeholder_text);

        let owner_contact = env::var("CHAT_OWNER_CONTACT")
            .ok()
            .filter(|v| !v.trim().is_empty());

        Self {
            reply_timeout,
            serialize_sends,
            placeholder_text,
            owner_contact,
            ..defaults
        }
    }

    pub fn with_reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }

    pub fn serialized(mut self) -> Self {
        self.serialize_sends = true;
        self
    }
}
