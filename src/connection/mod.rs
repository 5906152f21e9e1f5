//! Connection handles and their state.
//!
//! A [`Connection`] wraps one established TCP stream together with an explicit
//! [`ConnectionState`]. Handles are owned by the caller; the facade receives
//! them by `&mut` on every call and keeps nothing between calls.
//!
//! ## Connection Lifecycle
//!
//! 1. **Open** - returned by `connect`
//! 2. **Closed** - after `close`; every further operation except `close`
//!    fails with [`Error::Closed`](crate::Error::Closed)
//!
//! # Example
//!
//! ```rust,ignore
//! use rstcp::{Config, Connection};
//!
//! let mut conn = Connection::connect("127.0.0.1:7", &Config::default())?;
//! conn.write_all(b"ping")?;
//! let reply = conn.read(4, None)?;
//! conn.close()?;
//! ```

mod state;
mod stream;

pub use state::ConnectionState;
pub use stream::Connection;

#[cfg(feature = "async-tokio")]
mod async_stream;

#[cfg(feature = "async-tokio")]
pub use async_stream::AsyncConnection;
