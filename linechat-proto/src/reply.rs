//! Literal server-to-client reply lines.
//!
//! Both listeners reproduce these exact strings; clients are free to match
//! on them, so any change here is a wire-format change.

/// Prompt sent to a freshly accepted stream connection.
pub const USERNAME_PROMPT: &str = "Welcome. Enter your username:";

/// Rejection sent when an unregistered session submits a blank username.
pub const EMPTY_NAME_RETRY: &str = "Empty name. Try again:";

/// Acknowledgement sent to a session that issued the quit command.
pub const QUIT_ACK: &str = "Disconnecting. Goodbye!";

/// Sentinel substituted for an empty user list.
pub const NO_USERS: &str = "(no users)";

/// Confirmation sent to a session once its username is registered.
#[must_use]
pub fn registered(username: &str) -> String {
    format!("Connected as: {username}. Commands: /listar or listar, /quitar or quitar")
}

/// Join notice broadcast to the other sessions.
#[must_use]
pub fn joined(username: &str) -> String {
    format!("{username} has joined the chat.")
}

/// Departure notice broadcast when a registered session is removed.
#[must_use]
pub fn disconnected(username: &str) -> String {
    format!("{username} has disconnected.")
}

/// Reply to the list command; `users` is the comma-joined username list
/// or [`NO_USERS`].
#[must_use]
pub fn user_list(users: &str) -> String {
    format!("Connected users: {users}")
}

/// A chat line relayed to the other sessions.
#[must_use]
pub fn relayed(username: &str, line: &str) -> String {
    format!("[{username}] {line}")
}
