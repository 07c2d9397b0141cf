//! Concurrency-safe collection of the active sessions on one transport.
//!
//! The registry is the only resource shared between listener tasks. All
//! operations take `&self` and synchronise internally, so any number of
//! connection handlers can add, remove, and broadcast concurrently.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

use linechat_proto::reply;

use crate::session::{Outbound, Session, SessionId};

/// A registry slot pairing a session with its insertion sequence.
///
/// The sequence gives iteration a stable, insertion-matching order even
/// though the backing map is unordered.
struct Slot {
    seq: u64,
    session: Session,
}

/// Registry of active sessions, keyed by [`SessionId`].
///
/// Thread-safe via [`RwLock`]. Broadcast and listing snapshot the set
/// under the read lock and iterate in insertion order, so a session
/// added or removed mid-broadcast never corrupts iteration and a stable
/// session is reached exactly once.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, Slot>>,
    next_seq: AtomicU64,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    /// Creates a new, empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Inserts a new session. A no-op if the id is already present.
    ///
    /// Returns `true` if the session was inserted.
    pub async fn add(&self, id: SessionId, session: Session) -> bool {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&id) {
            return false;
        }
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        sessions.insert(id, Slot { seq, session });
        true
    }

    /// Removes a session.
    ///
    /// If the removed session was registered, the departure notice is
    /// broadcast to every remaining session. Returns `true` if a session
    /// was removed.
    pub async fn remove(&self, id: SessionId) -> bool {
        let removed = { self.sessions.write().await.remove(&id) };
        let Some(slot) = removed else {
            return false;
        };
        if let Some(username) = slot.session.username() {
            tracing::info!(session = %id, username = %username, "session removed");
            self.broadcast(&reply::disconnected(username), None).await;
        } else {
            tracing::info!(session = %id, "unregistered session removed");
        }
        true
    }

    /// Delivers `line` to every registered session except `exclude`.
    ///
    /// Pass `None` to reach everyone (used for departure notices).
    /// Outbound handles are snapshotted under the read lock and delivery
    /// happens outside it; a session removed mid-broadcast may still
    /// receive the line (best-effort, its channel absorbs the send).
    pub async fn broadcast(&self, line: &str, exclude: Option<SessionId>) {
        let mut targets: Vec<(u64, Outbound)> = {
            let sessions = self.sessions.read().await;
            sessions
                .iter()
                .filter(|(sid, slot)| Some(**sid) != exclude && slot.session.is_registered())
                .map(|(_, slot)| (slot.seq, slot.session.outbound().clone()))
                .collect()
        };
        targets.sort_unstable_by_key(|(seq, _)| *seq);
        tracing::debug!(recipients = targets.len(), "broadcasting line");
        for (_, outbound) in targets {
            outbound.send(line);
        }
    }

    /// Sends one line to a single session, if it is still present.
    pub async fn send_to(&self, id: SessionId, line: &str) {
        let sessions = self.sessions.read().await;
        if let Some(slot) = sessions.get(&id) {
            slot.session.send(line);
        }
    }

    /// Whether a session with this id is currently present.
    pub async fn contains(&self, id: SessionId) -> bool {
        self.sessions.read().await.contains_key(&id)
    }

    /// The session's username, or `None` if it is absent or unregistered.
    pub async fn username(&self, id: SessionId) -> Option<String> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .and_then(|slot| slot.session.username().map(str::to_string))
    }

    /// Registers a username for a session that does not have one yet.
    ///
    /// Returns `false` if the session is absent or already registered.
    pub async fn register_username(&self, id: SessionId, username: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&id) {
            Some(slot) if !slot.session.is_registered() => {
                slot.session.set_username(username);
                true
            }
            _ => false,
        }
    }

    /// Comma-joined usernames of all registered sessions, in insertion
    /// order. Sessions mid-handshake are excluded. Returns an empty
    /// string when nobody is registered; the caller substitutes its own
    /// sentinel.
    pub async fn list_usernames(&self) -> String {
        let sessions = self.sessions.read().await;
        let mut named: Vec<(u64, &str)> = sessions
            .values()
            .filter_map(|slot| slot.session.username().map(|u| (slot.seq, u)))
            .collect();
        named.sort_unstable_by_key(|(seq, _)| *seq);
        named
            .iter()
            .map(|(_, username)| *username)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Number of sessions currently in the registry, registered or not.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the registry holds no sessions at all.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
