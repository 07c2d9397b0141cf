//! Command dispatcher: interprets one incoming line per session.
//!
//! A session moves through `UNREGISTERED -> REGISTERED -> CLOSED`. The
//! first two states are tracked by whether the registry holds a username
//! for the session; `CLOSED` is signalled to the caller through
//! [`Outcome::Close`], which owns the actual transport teardown.

use linechat_proto::command::Command;
use linechat_proto::reply;

use crate::registry::SessionRegistry;
use crate::session::SessionId;

/// What the listener should do with the session after a line is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Keep the session open and continue reading.
    Continue,
    /// The session is done; tear down the transport and remove it from
    /// the registry.
    Close,
}

/// Feeds one raw input line from a session through the state machine.
///
/// An unregistered session is mid-handshake and the line is a username
/// attempt; a registered session follows the command grammar. A session
/// that is no longer in the registry gets [`Outcome::Close`] so the
/// caller stops reading.
pub async fn handle_line(registry: &SessionRegistry, id: SessionId, raw: &str) -> Outcome {
    if !registry.contains(id).await {
        return Outcome::Close;
    }
    match registry.username(id).await {
        Some(username) => handle_registered(registry, id, &username, raw).await,
        None => handle_registration(registry, id, raw).await,
    }
}

/// Handles a username attempt from a mid-handshake session.
///
/// Blank input is rejected with a re-prompt. On success the session gets
/// a confirmation line and the others get a join notice.
async fn handle_registration(registry: &SessionRegistry, id: SessionId, raw: &str) -> Outcome {
    let candidate = raw.trim();
    if candidate.is_empty() {
        registry.send_to(id, reply::EMPTY_NAME_RETRY).await;
        return Outcome::Continue;
    }

    if !registry.register_username(id, candidate).await {
        // The session vanished between the read and now.
        return Outcome::Close;
    }
    tracing::info!(session = %id, username = %candidate, "session registered");
    registry.send_to(id, &reply::registered(candidate)).await;
    registry.broadcast(&reply::joined(candidate), Some(id)).await;
    Outcome::Continue
}

/// Handles a line from a registered session: command or chat text.
async fn handle_registered(
    registry: &SessionRegistry,
    id: SessionId,
    username: &str,
    raw: &str,
) -> Outcome {
    match Command::parse(raw) {
        Command::Empty => Outcome::Continue,
        Command::List => {
            let users = registry.list_usernames().await;
            registry.send_to(id, &format_user_list(&users)).await;
            Outcome::Continue
        }
        Command::Quit => {
            registry.send_to(id, reply::QUIT_ACK).await;
            Outcome::Close
        }
        Command::Chat(text) => {
            tracing::debug!(session = %id, username = %username, "relaying chat line");
            registry
                .broadcast(&reply::relayed(username, &text), Some(id))
                .await;
            Outcome::Continue
        }
    }
}

/// Formats the list reply, substituting the sentinel for an empty list.
///
/// The substitution lives here rather than in the registry so the registry
/// keeps returning plain data.
fn format_user_list(users: &str) -> String {
    if users.is_empty() {
        reply::user_list(reply::NO_USERS)
    } else {
        reply::user_list(users)
    }
}
