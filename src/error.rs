//! Error types for socket operations.
//!
//! Three flavors of failure reach the caller: dialing failures
//! ([`Error::Connect`]), transport I/O failures ([`Error::Io`], [`Error::Closed`])
//! and read deadlines ([`Error::Timeout`]). Timeouts and closed handles are
//! I/O errors as far as [`Error::is_io`] is concerned.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for socket operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during socket operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Dialing the remote address failed (resolution, refusal, unreachable).
    #[error("Failed to connect to {addr}: {message}")]
    Connect {
        /// Address as given by the caller.
        addr: String,
        /// Kind of the underlying I/O error.
        kind: io::ErrorKind,
        /// Message of the underlying I/O error.
        message: String,
    },

    /// I/O error reported by the transport.
    #[error("I/O error: {message}")]
    Io {
        /// Kind of the underlying I/O error.
        kind: io::ErrorKind,
        /// Message of the underlying I/O error.
        message: String,
    },

    /// Read deadline elapsed before any data arrived.
    #[error("Read timed out after {0:?}")]
    Timeout(Duration),

    /// Operation attempted on a handle that has been closed.
    #[error("Use of closed connection")]
    Closed,

    /// Caller passed an argument this layer refuses.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Build a [`Error::Connect`] from the dial address and the transport error.
    pub fn connect(addr: impl Into<String>, err: &io::Error) -> Self {
        Error::Connect {
            addr: addr.into(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// The error a read reports once the peer has closed its write half.
    pub fn peer_closed() -> Self {
        Error::Io {
            kind: io::ErrorKind::UnexpectedEof,
            message: "connection closed by peer".into(),
        }
    }

    /// Check whether this is an I/O-class error.
    ///
    /// Timeouts and use-after-close count as I/O errors.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Error::Io { .. } | Error::Timeout(_) | Error::Closed)
    }

    /// Check whether this error is a read deadline expiry.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }

    /// Kind of the underlying transport error, if there was one.
    #[must_use]
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Error::Connect { kind, .. } | Error::Io { kind, .. } => Some(*kind),
            Error::Timeout(_) => Some(io::ErrorKind::TimedOut),
            Error::Closed => Some(io::ErrorKind::NotConnected),
            Error::InvalidArgument(_) => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}
