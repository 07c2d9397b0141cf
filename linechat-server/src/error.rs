//! Server error types.

/// Errors that can occur while starting a listener.
///
/// Bind failures are fatal: the caller reports them once and exits, no
/// retry is attempted.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listener could not bind its address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was attempted.
        addr: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The bound socket's local address could not be read.
    #[error("failed to read local address: {0}")]
    LocalAddr(#[from] std::io::Error),
}
