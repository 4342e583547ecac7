//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

/// Chatbot API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Also store the incoming user message before the reply.
    pub store_user_message: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `CHATBOT_ADDR` | Server bind address | `127.0.0.1:8790` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:chat.db?mode=rwc` |
    /// | `CHATBOT_STORE_USER_MESSAGE` | Persist the user message of requests without a slot id | `false` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("CHATBOT_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8790".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url =
            env::var("SQLITE_PATH").unwrap_or_else(|_| "sqlite:chat.db?mode=rwc".to_string());

        let store_user_message = match env::var("CHATBOT_STORE_USER_MESSAGE") {
            Ok(value) => parse_flag(&value).ok_or(ConfigError::InvalidFlag(value))?,
            Err(_) => false,
        };

        Ok(Self {
            addr,
            database_url,
            store_user_message,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" | "" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid CHATBOT_ADDR format")]
    InvalidAddr,

    #[error("Invalid CHATBOT_STORE_USER_MESSAGE value: {0}")]
    InvalidFlag(String),
}
