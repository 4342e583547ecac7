//! Configuration types for reply-client.

use std::env;
use std::time::Duration;

use thiserror::Error;

/// Default bound on a reply request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Configuration for the reply webhook.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Full URL the message is POSTed to.
    pub url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Contact address sent along with every request, if any.
    pub owner_contact: Option<String>,
}

impl WebhookConfig {
    /// Create a new configuration with the given webhook URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
            owner_contact: None,
        }
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `REPLY_WEBHOOK_URL` | Webhook URL | (required) |
    /// | `REPLY_TIMEOUT_SECS` | Request timeout in seconds | `8` |
    /// | `REPLY_OWNER_CONTACT` | Contact sent as `user_email` | (none) |
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var("REPLY_WEBHOOK_URL").map_err(|_| ConfigError::MissingUrl)?;
        if url.trim().is_empty() {
            return Err(ConfigError::MissingUrl);
        }

        let timeout = match env::var("REPLY_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidTimeout(raw))?,
            Err(_) => DEFAULT_TIMEOUT,
        };

        let owner_contact = env::var("REPLY_OWNER_CONTACT")
            .ok()
            .filter(|v| !v.trim().is_empty());

        Ok(Self {
            url,
            timeout,
            owner_contact,
        })
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("REPLY_WEBHOOK_URL environment variable is required")]
    MissingUrl,

    #[error("Invalid REPLY_TIMEOUT_SECS: {0}")]
    InvalidTimeout(String),
}
