//! End-to-end tests for the stream listener: registration handshake,
//! broadcast semantics, commands, and teardown over real sockets.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::{Duration, timeout};

use linechat_server::registry::SessionRegistry;
use linechat_server::tcp;

/// Starts a listener on an OS-assigned port with a fresh registry.
async fn start_test_server() -> SocketAddr {
    let registry = Arc::new(SessionRegistry::new());
    let (addr, _handle) = tcp::start_server("127.0.0.1:0", registry)
        .await
        .expect("failed to start test server");
    addr
}

/// A line-oriented test client.
struct TestClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    write: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, write_half) = stream.into_split();
        Self {
            lines: BufReader::new(read_half).lines(),
            write: write_half,
        }
    }

    /// Connects and completes the registration handshake.
    async fn register(addr: SocketAddr, username: &str) -> Self {
        let mut client = Self::connect(addr).await;
        assert_eq!(client.recv().await, "Welcome. Enter your username:");
        client.send(username).await;
        assert_eq!(
            client.recv().await,
            format!("Connected as: {username}. Commands: /listar or listar, /quitar or quitar")
        );
        client
    }

    async fn send(&mut self, line: &str) {
        self.write
            .write_all(format!("{line}\n").as_bytes())
            .await
            .unwrap();
    }

    async fn recv(&mut self) -> String {
        timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("timed out waiting for a server line")
            .unwrap()
            .expect("server closed the connection")
    }

    /// Waits for the server to close the connection.
    async fn recv_eof(&mut self) {
        let eof = timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("timed out waiting for EOF")
            .unwrap();
        assert_eq!(eof, None, "expected end of stream");
    }
}

#[tokio::test]
async fn prompt_and_registration_handshake() {
    let addr = start_test_server().await;
    let _alice = TestClient::register(addr, "alice").await;
}

#[tokio::test]
async fn blank_username_is_reprompted_until_valid() {
    let addr = start_test_server().await;

    let mut client = TestClient::connect(addr).await;
    assert_eq!(client.recv().await, "Welcome. Enter your username:");

    client.send("").await;
    assert_eq!(client.recv().await, "Empty name. Try again:");
    client.send("   ").await;
    assert_eq!(client.recv().await, "Empty name. Try again:");

    client.send("alice").await;
    assert_eq!(
        client.recv().await,
        "Connected as: alice. Commands: /listar or listar, /quitar or quitar"
    );
}

#[tokio::test]
async fn join_notice_reaches_existing_clients_only() {
    let addr = start_test_server().await;

    let mut alice = TestClient::register(addr, "alice").await;
    let mut bob = TestClient::register(addr, "bob").await;

    assert_eq!(alice.recv().await, "bob has joined the chat.");

    // Bob saw his confirmation but no notice about himself: his next
    // line is alice's chat message, nothing in between.
    alice.send("hi bob").await;
    assert_eq!(bob.recv().await, "[alice] hi bob");
}

#[tokio::test]
async fn chat_is_relayed_but_never_echoed() {
    let addr = start_test_server().await;

    let mut alice = TestClient::register(addr, "alice").await;
    let mut bob = TestClient::register(addr, "bob").await;
    assert_eq!(alice.recv().await, "bob has joined the chat.");

    bob.send("hello").await;
    assert_eq!(alice.recv().await, "[bob] hello");

    // If "hello" had been echoed, bob's next line would be "[bob] hello".
    alice.send("hey").await;
    assert_eq!(bob.recv().await, "[alice] hey");
}

#[tokio::test]
async fn listar_replies_in_join_order_to_sender_only() {
    let addr = start_test_server().await;

    let mut alice = TestClient::register(addr, "alice").await;
    let mut bob = TestClient::register(addr, "bob").await;
    assert_eq!(alice.recv().await, "bob has joined the chat.");

    bob.send("/listar").await;
    assert_eq!(bob.recv().await, "Connected users: alice, bob");

    // The bare form works too, and alice never saw bob's query.
    alice.send("listar").await;
    assert_eq!(alice.recv().await, "Connected users: alice, bob");
}

#[tokio::test]
async fn mid_handshake_sessions_are_not_listed() {
    let addr = start_test_server().await;

    let mut alice = TestClient::register(addr, "alice").await;

    // A second client that never sends a username.
    let mut lurker = TestClient::connect(addr).await;
    assert_eq!(lurker.recv().await, "Welcome. Enter your username:");

    alice.send("listar").await;
    assert_eq!(alice.recv().await, "Connected users: alice");
}

#[tokio::test]
async fn empty_line_is_ignored_when_registered() {
    let addr = start_test_server().await;

    let mut alice = TestClient::register(addr, "alice").await;
    let mut bob = TestClient::register(addr, "bob").await;
    assert_eq!(alice.recv().await, "bob has joined the chat.");

    bob.send("").await;
    bob.send("after the blank").await;

    // Alice sees only the real message; the blank produced nothing.
    assert_eq!(alice.recv().await, "[bob] after the blank");
}

#[tokio::test]
async fn quit_acknowledges_notifies_others_and_closes() {
    let addr = start_test_server().await;

    let mut alice = TestClient::register(addr, "alice").await;
    let mut bob = TestClient::register(addr, "bob").await;
    assert_eq!(alice.recv().await, "bob has joined the chat.");

    bob.send("/quitar").await;
    assert_eq!(bob.recv().await, "Disconnecting. Goodbye!");
    bob.recv_eof().await;

    assert_eq!(alice.recv().await, "bob has disconnected.");
}

#[tokio::test]
async fn bare_quit_form_works_too() {
    let addr = start_test_server().await;

    let mut alice = TestClient::register(addr, "alice").await;
    alice.send("QUITAR").await;
    assert_eq!(alice.recv().await, "Disconnecting. Goodbye!");
    alice.recv_eof().await;
}

#[tokio::test]
async fn abrupt_disconnect_broadcasts_departure() {
    let addr = start_test_server().await;

    let mut alice = TestClient::register(addr, "alice").await;
    let bob = TestClient::register(addr, "bob").await;
    assert_eq!(alice.recv().await, "bob has joined the chat.");

    // Bob's process dies: socket closed without a quit command.
    drop(bob);

    assert_eq!(alice.recv().await, "bob has disconnected.");
}

#[tokio::test]
async fn disconnect_during_handshake_is_silent() {
    let addr = start_test_server().await;

    let mut alice = TestClient::register(addr, "alice").await;

    // Connect and vanish without registering.
    let mut lurker = TestClient::connect(addr).await;
    assert_eq!(lurker.recv().await, "Welcome. Enter your username:");
    drop(lurker);

    // Alice's next line is a chat relay, not a departure notice.
    let mut bob = TestClient::register(addr, "bob").await;
    assert_eq!(alice.recv().await, "bob has joined the chat.");
    bob.send("still here").await;
    assert_eq!(alice.recv().await, "[bob] still here");
}

#[tokio::test]
async fn duplicate_usernames_are_both_listed() {
    let addr = start_test_server().await;

    let mut first = TestClient::register(addr, "alice").await;
    let mut second = TestClient::register(addr, "alice").await;
    assert_eq!(first.recv().await, "alice has joined the chat.");

    second.send("/listar").await;
    assert_eq!(second.recv().await, "Connected users: alice, alice");

    // Addressing is by session, so the sender still gets no echo.
    first.send("which alice?").await;
    assert_eq!(second.recv().await, "[alice] which alice?");
}

#[tokio::test]
async fn three_clients_all_receive_a_broadcast_once() {
    let addr = start_test_server().await;

    let mut alice = TestClient::register(addr, "alice").await;
    let mut bob = TestClient::register(addr, "bob").await;
    assert_eq!(alice.recv().await, "bob has joined the chat.");
    let mut carol = TestClient::register(addr, "carol").await;
    assert_eq!(alice.recv().await, "carol has joined the chat.");
    assert_eq!(bob.recv().await, "carol has joined the chat.");

    carol.send("hello everyone").await;
    assert_eq!(alice.recv().await, "[carol] hello everyone");
    assert_eq!(bob.recv().await, "[carol] hello everyone");

    // Exactly once: the next line each receives is a fresh message.
    alice.send("welcome carol").await;
    assert_eq!(bob.recv().await, "[alice] welcome carol");
    assert_eq!(carol.recv().await, "[alice] welcome carol");
}
