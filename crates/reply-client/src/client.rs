//! Reply webhook HTTP client.

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use chat_core::{async_trait, ReplyError, ReplyRequest, ReplyService};

use crate::config::WebhookConfig;
use crate::shapes;

/// Longest body excerpt kept in a `Malformed` error.
const BODY_EXCERPT_CHARS: usize = 200;

/// Client for the reply webhook.
#[derive(Clone)]
pub struct WebhookClient {
    http: Client,
    config: WebhookConfig,
}

impl WebhookClient {
    /// Build a client for the configured webhook.
    pub fn new(config: WebhookConfig) -> Result<Self, ReplyError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ReplyError::Transport(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// Get the configuration.
    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    fn map_send_error(&self, err: reqwest::Error) -> ReplyError {
        if err.is_timeout() {
            ReplyError::Timeout(self.config.timeout)
        } else {
            ReplyError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl ReplyService for WebhookClient {
    async fn request_reply(&self, mut request: ReplyRequest) -> Result<String, ReplyError> {
        if request.owner_contact.is_none() {
            request.owner_contact = self.config.owner_contact.clone();
        }

        debug!(owner = %request.owner, slot = ?request.slot_ref, "POST {}", self.config.url);

        let response = self
            .http
            .post(&self.config.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Reply webhook returned an error status");
            return Err(ReplyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|e| ReplyError::Malformed(format!("invalid JSON ({e}): {}", excerpt(&body))))?;

        match shapes::extract_reply(&value) {
            Some((shape, text)) => {
                debug!(shape, "Parsed webhook reply");
                Ok(text)
            }
            None => Err(ReplyError::Malformed(format!(
                "no reply field: {}",
                excerpt(&body)
            ))),
        }
    }

    fn name(&self) -> &str {
        "WebhookClient"
    }
}

impl std::fmt::Debug for WebhookClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookClient")
            .field("config", &self.config)
            .finish()
    }
}

fn excerpt(body: &str) -> String {
    if body.chars().count() <= BODY_EXCERPT_CHARS {
        body.to_string()
    } else {
        let cut: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
        format!("{cut}...")
    }
}
