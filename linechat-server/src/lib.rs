//! `LineChat` server library.
//!
//! Exposes the session registry, command dispatcher, and both listeners
//! for use in tests and embedding. The TCP listener keeps one session per
//! connection; the UDP listener infers sessions from source addresses.
//! Each transport owns an independent [`registry::SessionRegistry`].

pub mod config;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod session;
pub mod tcp;
pub mod udp;
