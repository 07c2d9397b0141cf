//! Shared protocol definitions for the `LineChat` text wire format.

pub mod command;
pub mod reply;

/// Hard ceiling on a single datagram payload, in bytes.
///
/// The UDP listener receives into a fixed buffer of this size; anything
/// longer is truncated by the transport and must not be sent.
pub const MAX_DATAGRAM_LEN: usize = 1024;
