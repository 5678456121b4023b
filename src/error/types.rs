//! Error types
//!
//! Defines the errors raised while opening a data channel and the
//! terminal error recorded when a passive accept fails.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

/// Data channel errors
#[derive(Debug, Error)]
pub enum DataChannelError {
    #[error("Failed to resolve {addr}: {source}")]
    Resolve { addr: String, source: io::Error },

    #[error("No usable address for {0}")]
    NoAddress(String),

    #[error("Failed to connect to {addr}: {source}")]
    Connect { addr: String, source: io::Error },

    #[error("Failed to bind data listener on {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("Failed to read bound listener address: {0}")]
    LocalAddr(#[source] io::Error),

    #[error("Failed to accept data connection: {0}")]
    Accept(#[source] io::Error),

    #[error("TLS handshake with {peer} failed: {source}")]
    Handshake { peer: SocketAddr, source: io::Error },

    #[error("Data channel closed before a client connected")]
    Closed,

    #[error("Accept task ended before a client connected")]
    AcceptAbandoned,
}

impl DataChannelError {
    /// The `io::ErrorKind` reported when this error surfaces from a read or write.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            DataChannelError::Resolve { source, .. }
            | DataChannelError::Connect { source, .. }
            | DataChannelError::Bind { source, .. }
            | DataChannelError::Handshake { source, .. } => source.kind(),
            DataChannelError::LocalAddr(e) | DataChannelError::Accept(e) => e.kind(),
            DataChannelError::NoAddress(_) => io::ErrorKind::AddrNotAvailable,
            DataChannelError::Closed | DataChannelError::AcceptAbandoned => {
                io::ErrorKind::ConnectionAborted
            }
        }
    }
}

impl From<DataChannelError> for io::Error {
    fn from(error: DataChannelError) -> Self {
        io::Error::new(error.kind(), error)
    }
}

/// Builds an `io::Error` around a recorded error so every caller sees the
/// same kind and message.
pub(crate) fn shared_io_error(error: &Arc<DataChannelError>) -> io::Error {
    io::Error::new(error.kind(), Arc::clone(error))
}
