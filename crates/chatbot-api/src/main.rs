//! Chatbot API server.

use std::sync::Arc;

use chatbot_api::{AppState, Config};
use database::ChatStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("chatbot_api=info".parse()?))
        .init();

    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting chatbot API");

    let store = ChatStore::connect(&config.database_url).await?;
    store.migrate().await?;

    let state = AppState::new(Arc::new(store)).storing_user_messages(config.store_user_message);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    chatbot_api::serve(listener, state).await?;

    Ok(())
}
