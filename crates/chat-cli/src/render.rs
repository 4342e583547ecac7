//! Transcript rendering.

use chat_core::{Message, MessageStatus, Sender};

/// One line per message: `[you] hello`, `[bot] hi there`.
pub fn line(message: &Message) -> String {
    let who = match message.sender {
        Sender::User => "you",
        Sender::Bot => "bot",
    };
    let marker = match message.status {
        MessageStatus::Confirmed => "",
        MessageStatus::Pending => " …",
        MessageStatus::Failed => " (!)",
    };
    format!(
        "{} [{}] {}{}",
        message.created_at.format("%H:%M:%S"),
        who,
        message.content,
        marker
    )
}

pub fn transcript(messages: &[Message]) -> String {
    if messages.is_empty() {
        return "(no messages)".to_string();
    }
    messages.iter().map(line).collect::<Vec<_>>().join("\n")
}
