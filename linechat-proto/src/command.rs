//! Command grammar for registered chat sessions.
//!
//! Commands are recognised case-insensitively, both with and without a
//! leading slash, to tolerate clients that do not prefix commands. Any
//! line that is not a command is a chat message to be relayed.

/// A classified input line from a registered session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `listar` / `/listar` — request the connected user list.
    List,
    /// `quitar` / `/quitar` — leave the chat.
    Quit,
    /// Empty or whitespace-only input; ignored without a reply.
    Empty,
    /// Anything else, trimmed, relayed verbatim as chat text.
    Chat(String),
}

impl Command {
    /// Classifies one raw input line.
    ///
    /// The line is trimmed before classification; both command forms are
    /// checked for every command, so `LISTAR` and `/Listar` are equivalent.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        match trimmed.to_lowercase().as_str() {
            "listar" | "/listar" => Self::List,
            "quitar" | "/quitar" => Self::Quit,
            _ => Self::Chat(trimmed.to_string()),
        }
    }
}
