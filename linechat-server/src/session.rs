//! One connected participant: identity plus outbound channel.

use std::fmt;
use std::net::SocketAddr;

use tokio::sync::mpsc;

/// Stable identifier for a session.
///
/// Stream sessions are keyed by an id minted per accepted connection;
/// datagram sessions are keyed by the sender's source address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionId {
    /// A stream connection, identified in accept order.
    Conn(u64),
    /// A datagram peer, identified by its source address.
    Peer(SocketAddr),
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conn(n) => write!(f, "conn-{n}"),
            Self::Peer(addr) => write!(f, "{addr}"),
        }
    }
}

/// The mechanism that delivers one line of text to a session's remote peer.
///
/// Both variants hand the line to a writer task over an unbounded channel,
/// so delivery never blocks the caller and never interleaves partial lines
/// on one connection.
#[derive(Debug, Clone)]
pub enum Outbound {
    /// Sender half of a per-connection writer task's channel.
    Stream(mpsc::UnboundedSender<String>),
    /// Address-tagged sender into the shared datagram writer task.
    Datagram {
        /// Channel drained by the socket writer task.
        tx: mpsc::UnboundedSender<(SocketAddr, String)>,
        /// Destination address for this session's datagrams.
        addr: SocketAddr,
    },
}

impl Outbound {
    /// Enqueues one line for delivery to the peer.
    ///
    /// Failures are absorbed: a dead session must not abort a broadcast
    /// to the remaining sessions.
    pub fn send(&self, line: &str) {
        match self {
            Self::Stream(tx) => {
                let _ = tx.send(line.to_string());
            }
            Self::Datagram { tx, addr } => {
                let _ = tx.send((*addr, line.to_string()));
            }
        }
    }
}

/// One active participant tracked by the registry.
#[derive(Debug)]
pub struct Session {
    username: Option<String>,
    outbound: Outbound,
}

impl Session {
    /// Creates a session that has not completed registration yet.
    #[must_use]
    pub const fn new(outbound: Outbound) -> Self {
        Self {
            username: None,
            outbound,
        }
    }

    /// Creates a session that is registered from the start.
    ///
    /// Used by the datagram listener, where first contact and registration
    /// are the same transition.
    #[must_use]
    pub fn registered(username: impl Into<String>, outbound: Outbound) -> Self {
        Self {
            username: Some(username.into()),
            outbound,
        }
    }

    /// The display name, if registration has completed.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Whether this session has a username.
    #[must_use]
    pub const fn is_registered(&self) -> bool {
        self.username.is_some()
    }

    /// Sets the display name. Once set, the name stays for the session's
    /// lifetime; a second call is a no-op.
    pub(crate) fn set_username(&mut self, name: &str) {
        if self.username.is_none() {
            self.username = Some(name.to_string());
        }
    }

    /// Enqueues one line of text for the remote peer.
    pub fn send(&self, line: &str) {
        self.outbound.send(line);
    }

    pub(crate) const fn outbound(&self) -> &Outbound {
        &self.outbound
    }
}
