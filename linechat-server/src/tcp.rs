//! Connection-oriented listener: accept loop and per-connection session
//! handling over newline-delimited UTF-8.
//!
//! Each accepted connection gets a reader task (this handler) and a
//! writer task draining the session's outbound channel, so broadcasts
//! from other handlers never interleave partial lines on one socket.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use linechat_proto::reply;

use crate::dispatch::{self, Outcome};
use crate::error::ServerError;
use crate::registry::SessionRegistry;
use crate::session::{Outbound, Session, SessionId};

/// Monotonic id source for accepted connections.
static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(0);

/// Binds the stream listener and spawns its accept loop.
///
/// Returns the bound address and a join handle for the accept loop. The
/// registry is shared with every connection handler the loop spawns.
///
/// # Errors
///
/// Returns [`ServerError`] if the listener cannot bind the address.
pub async fn start_server(
    addr: &str,
    registry: Arc<SessionRegistry>,
) -> Result<(SocketAddr, JoinHandle<()>), ServerError> {
    let listener = TcpListener::bind(addr).await.map_err(|e| ServerError::Bind {
        addr: addr.to_string(),
        source: e,
    })?;
    let bound_addr = listener.local_addr().map_err(ServerError::LocalAddr)?;
    let handle = tokio::spawn(accept_loop(listener, registry));
    Ok((bound_addr, handle))
}

/// Accepts connections forever, one handler task per connection.
///
/// An accept error is logged and the loop continues; it never takes down
/// the other sessions.
async fn accept_loop(listener: TcpListener, registry: Arc<SessionRegistry>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                tracing::info!(peer = %peer, "client connected");
                let registry = Arc::clone(&registry);
                tokio::spawn(handle_connection(stream, registry));
            }
            Err(e) => {
                tracing::warn!(error = %e, "accept failed");
            }
        }
    }
}

/// Drives one connection from accept to teardown.
///
/// The connection lifecycle:
/// 1. Mint a [`SessionId`] and spawn the writer task.
/// 2. Add the session and send the username prompt.
/// 3. Read lines, feeding each through the dispatcher (which also runs
///    the registration handshake).
/// 4. On end-of-stream, read error, or a `Close` outcome, remove the
///    session; removal broadcasts the departure notice if it was
///    registered and drops the outbound sender, which lets the writer
///    task drain any pending replies and close the socket.
async fn handle_connection(stream: TcpStream, registry: Arc<SessionRegistry>) {
    let id = SessionId::Conn(NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed));
    let (read_half, write_half) = stream.into_split();

    let (tx, rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(write_loop(write_half, rx, id));

    registry.add(id, Session::new(Outbound::Stream(tx))).await;
    registry.send_to(id, reply::USERNAME_PROMPT).await;

    let mut lines = BufReader::new(read_half).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if dispatch::handle_line(&registry, id, &line).await == Outcome::Close {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(session = %id, error = %e, "read failed");
                break;
            }
        }
    }

    registry.remove(id).await;
    let _ = writer.await;
    tracing::info!(session = %id, "session closed");
}

/// Writes newline-terminated lines from the outbound channel to the
/// socket until the channel closes or a write fails.
async fn write_loop(
    mut write_half: OwnedWriteHalf,
    mut rx: mpsc::UnboundedReceiver<String>,
    id: SessionId,
) {
    while let Some(line) = rx.recv().await {
        let framed = format!("{line}\n");
        if write_half.write_all(framed.as_bytes()).await.is_err() {
            tracing::warn!(session = %id, "write failed");
            break;
        }
    }
    let _ = write_half.shutdown().await;
}
