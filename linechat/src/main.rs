//! `LineChat` -- thin terminal client.
//!
//! Connects to a `LineChat` server over TCP (default) or UDP, prints
//! every server line to stdout, and forwards every stdin line to the
//! server. All protocol logic lives server-side; the only thing this
//! client interprets is the quit command, so it knows when to exit.
//!
//! ```bash
//! # TCP, default server 127.0.0.1:5000
//! cargo run --bin linechat
//!
//! # UDP against a custom server
//! cargo run --bin linechat -- --server 127.0.0.1:5001 --transport udp
//! ```

use std::io;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpStream, UdpSocket};

use linechat_proto::MAX_DATAGRAM_LEN;
use linechat_proto::command::Command;

/// Transport to reach the server over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// Persistent stream connection, newline-delimited.
    Tcp,
    /// One datagram per message.
    Udp,
}

/// CLI arguments for the client.
#[derive(clap::Parser, Debug)]
#[command(version, about = "LineChat terminal client")]
struct CliArgs {
    /// Server address to connect to.
    #[arg(short, long, default_value = "127.0.0.1:5000", env = "LINECHAT_SERVER")]
    server: String,

    /// Transport to use.
    #[arg(short, long, value_enum, default_value_t = Transport::Tcp)]
    transport: Transport,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();
    match cli.transport {
        Transport::Tcp => run_tcp(&cli.server).await,
        Transport::Udp => run_udp(&cli.server).await,
    }
}

/// Whether the user asked to leave, in either command form.
fn is_quit(line: &str) -> bool {
    matches!(Command::parse(line), Command::Quit)
}

/// Stream session: the server drives the handshake, so the client only
/// shuttles lines in both directions.
async fn run_tcp(server: &str) -> io::Result<()> {
    println!("Connecting to {server} ...");
    let stream = TcpStream::connect(server).await?;
    let (read_half, mut write_half) = stream.into_split();

    let printer = tokio::spawn(async move {
        let mut lines = BufReader::new(read_half).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            println!("{line}");
        }
        println!("Connection closed by server.");
    });

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = stdin.next_line().await? {
        write_half.write_all(format!("{line}\n").as_bytes()).await?;
        if is_quit(&line) {
            break;
        }
    }
    let _ = write_half.shutdown().await;

    // Let the printer drain the server's goodbye before exiting.
    let _ = printer.await;
    Ok(())
}

/// Datagram session: the first line sent is the username, per the
/// server's first-contact registration.
async fn run_udp(server: &str) -> io::Result<()> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.connect(server).await?;
    let socket = Arc::new(socket);

    println!("Chatting with {server} over UDP. First line is your username.");

    let recv_socket = Arc::clone(&socket);
    let printer = tokio::spawn(async move {
        let mut buf = [0u8; MAX_DATAGRAM_LEN];
        while let Ok(len) = recv_socket.recv(&mut buf).await {
            println!("{}", String::from_utf8_lossy(&buf[..len]));
        }
    });

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = stdin.next_line().await? {
        socket.send(line.as_bytes()).await?;
        if is_quit(&line) {
            break;
        }
    }

    // Give the farewell datagram a moment to arrive, then stop listening.
    tokio::time::sleep(Duration::from_millis(200)).await;
    printer.abort();
    Ok(())
}
