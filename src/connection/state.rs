//! Connection state tracked alongside each handle.

/// Lifecycle state of a connection handle.
///
/// A handle starts `Open` when `connect` succeeds and becomes `Closed` once
/// `close` has been called on it. Transport failures do not change the state;
/// they surface as errors from the operation that hit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum ConnectionState {
    /// Connection is established and usable.
    #[default]
    Open,
    /// `close` has been called.
    Closed,
}

impl ConnectionState {
    /// Check if I/O is allowed in this state.
    #[must_use]
    #[inline]
    pub const fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Open => write!(f, "Open"),
            ConnectionState::Closed => write!(f, "Closed"),
        }
    }
}
