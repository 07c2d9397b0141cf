//! Connectionless listener: one datagram socket, sessions keyed by
//! source address.
//!
//! There is no handshake message in-band: the first datagram from an
//! unseen address is taken as the username and the session is registered
//! on the spot. All state transitions happen inline in the single
//! receive loop; a dedicated writer task owns the send side of the
//! socket so session outbound channels stay uniform with the stream
//! listener.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use linechat_proto::{MAX_DATAGRAM_LEN, reply};

use crate::dispatch::{self, Outcome};
use crate::error::ServerError;
use crate::registry::SessionRegistry;
use crate::session::{Outbound, Session, SessionId};

/// Binds the datagram listener and spawns its receive and send loops.
///
/// Returns the bound address and a join handle for the receive loop.
///
/// # Errors
///
/// Returns [`ServerError`] if the socket cannot bind the address.
pub async fn start_server(
    addr: &str,
    registry: Arc<SessionRegistry>,
) -> Result<(SocketAddr, JoinHandle<()>), ServerError> {
    let socket = UdpSocket::bind(addr).await.map_err(|e| ServerError::Bind {
        addr: addr.to_string(),
        source: e,
    })?;
    let bound_addr = socket.local_addr().map_err(ServerError::LocalAddr)?;
    let socket = Arc::new(socket);

    let (tx, rx) = mpsc::unbounded_channel::<(SocketAddr, String)>();
    tokio::spawn(send_loop(Arc::clone(&socket), rx));
    let handle = tokio::spawn(recv_loop(socket, registry, tx));
    Ok((bound_addr, handle))
}

/// Drains outbound lines onto the shared socket.
///
/// A failed send only loses that one datagram; the loop keeps going.
async fn send_loop(socket: Arc<UdpSocket>, mut rx: mpsc::UnboundedReceiver<(SocketAddr, String)>) {
    while let Some((addr, line)) = rx.recv().await {
        if let Err(e) = socket.send_to(line.as_bytes(), addr).await {
            tracing::warn!(peer = %addr, error = %e, "datagram send failed");
        }
    }
}

/// Receives datagrams one at a time and demultiplexes them by source
/// address into implicit sessions.
async fn recv_loop(
    socket: Arc<UdpSocket>,
    registry: Arc<SessionRegistry>,
    tx: mpsc::UnboundedSender<(SocketAddr, String)>,
) {
    let mut buf = [0u8; MAX_DATAGRAM_LEN];
    loop {
        let (len, peer) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                tracing::warn!(error = %e, "datagram receive failed");
                continue;
            }
        };
        let payload = String::from_utf8_lossy(&buf[..len]);
        let line = payload.trim();
        let id = SessionId::Peer(peer);

        if registry.contains(id).await {
            if dispatch::handle_line(&registry, id, line).await == Outcome::Close {
                // No connection to close; dropping the registry entry is
                // the whole teardown. Removal broadcasts the departure.
                registry.remove(id).await;
            }
        } else {
            // First contact doubles as registration: the payload is the
            // username, taken as-is. Blank names are not rejected on this
            // path and silent peers are never expired; both preserved
            // from the reference behavior.
            let username = line.to_string();
            tracing::info!(peer = %peer, username = %username, "datagram peer registered");
            let outbound = Outbound::Datagram {
                tx: tx.clone(),
                addr: peer,
            };
            registry
                .add(id, Session::registered(username.clone(), outbound))
                .await;
            registry.send_to(id, &reply::registered(&username)).await;
        }
    }
}
