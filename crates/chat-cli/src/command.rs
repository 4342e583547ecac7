//! Input line parsing.

/// What a line typed at the prompt asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send the text as a message.
    Send(String),
    /// Reprint the transcript.
    History,
    /// Delete the stored history.
    Clear,
    /// Leave the client.
    Quit,
    /// Print the command list.
    Help,
    /// Blank line.
    Nothing,
    /// A slash command we don't know.
    Unknown(String),
}

pub const HELP: &str = "Commands: /history, /clear, /quit, /help. Anything else is sent.";

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Nothing;
        }
        let Some(name) = line.strip_prefix('/') else {
            return Command::Send(line.to_string());
        };
        match name.to_lowercase().as_str() {
            "history" => Command::History,
            "clear" => Command::Clear,
            "quit" | "exit" => Command::Quit,
            "help" => Command::Help,
            _ => Command::Unknown(line.to_string()),
        }
    }
}
