//! Terminal chat client.
//!
//! Loads one owner's history from the SQLite store, listens for rows pushed
//! by other writers and sends each typed line through the conversation
//! controller. Without `--webhook-url` the reference chatbot API is started
//! in-process on the same store.

mod command;
mod render;

use std::sync::Arc;
use std::time::Duration;

use chat_core::OwnerId;
use chatbot_api::AppState;
use clap::Parser;
use conversation::{Conversation, ConversationConfig};
use database::ChatStore;
use reply_client::{WebhookClient, WebhookConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::command::{Command, HELP};

#[derive(Debug, Parser)]
#[command(name = "chat-cli")]
#[command(about = "Chat with a webhook-backed assistant from the terminal")]
struct Args {
    /// Conversation owner id
    #[arg(long)]
    owner: String,

    /// SQLite database URL
    #[arg(long, env = "SQLITE_PATH", default_value = "sqlite:chat.db?mode=rwc")]
    database_url: String,

    /// Reply webhook URL. Starts the built-in chatbot API when omitted.
    #[arg(long, env = "REPLY_WEBHOOK_URL")]
    webhook_url: Option<String>,

    /// Reply timeout in seconds
    #[arg(long, default_value_t = 8)]
    timeout_secs: u64,

    /// Refuse to send while a reply is still pending
    #[arg(long)]
    serialize_sends: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("chat_cli=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let owner = OwnerId::parse(args.owner.as_str()).ok_or("--owner must not be empty")?;

    let store = Arc::new(ChatStore::connect(&args.database_url).await?);
    store.migrate().await?;

    let webhook_url = match args.webhook_url {
        Some(url) => url,
        None => {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
            let addr = listener.local_addr()?;
            let state = AppState::new(store.clone());
            tokio::spawn(async move {
                if let Err(e) = chatbot_api::serve(listener, state).await {
                    warn!(error = %e, "Built-in chatbot API stopped");
                }
            });
            format!("http://{}/api/chatbot", addr)
        }
    };
    info!(url = %webhook_url, "Using reply webhook");

    let timeout = Duration::from_secs(args.timeout_secs.max(1));
    let replies = Arc::new(WebhookClient::new(
        WebhookConfig::new(webhook_url).with_timeout(timeout),
    )?);

    let mut config = ConversationConfig::from_env().with_reply_timeout(timeout);
    if args.serialize_sends {
        config = config.serialized();
    }

    let chat = Conversation::new(store.clone(), replies, config);
    chat.load_history(&owner).await;
    let listener = chat.spawn_push_listener().await?;

    println!("{}", render::transcript(&chat.messages().await));
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Send(text) => {
                let chat = chat.clone();
                let owner = owner.clone();
                tokio::spawn(async move {
                    match chat.send(&owner, &text).await {
                        Ok(receipt) => {
                            let messages = chat.messages().await;
                            if let Some(reply) = messages.iter().find(|m| m.local_id == receipt.slot) {
                                println!("{}", render::line(reply));
                            }
                        }
                        Err(e) => println!("! {}", e),
                    }
                });
            }
            Command::History => println!("{}", render::transcript(&chat.messages().await)),
            Command::Clear => match chat.clear(&owner).await {
                Ok(removed) => println!("Cleared {} stored messages.", removed),
                Err(e) => println!("! Could not clear history: {}", e),
            },
            Command::Help => println!("{}", HELP),
            Command::Unknown(name) => println!("Unknown command {}. {}", name, HELP),
            Command::Nothing => {}
            Command::Quit => break,
        }
    }

    listener.abort();
    chat.close().await;
    store.close().await;
    Ok(())
}
