//! # rstcp - Raw TCP Primitives for Load-Testing Scripts
//!
//! `rstcp` exposes five socket operations to a script host, bound to one
//! virtual user at a time:
//!
//! - `connect(addr)` opens a TCP connection and returns a caller-owned handle
//! - `write(handle, bytes)` sends the whole payload and records `data_sent`
//! - `read(handle, max_size, timeout_ms)` returns what one `recv` produced
//! - `write_line(handle, bytes)` is `write` with a trailing `\n`
//! - `close(handle)` shuts the connection down; closing twice is a no-op
//!
//! There is no framing, pooling, retry or buffering. Read timeouts never
//! outlive the call that set them.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rstcp::{ChannelSink, Config, Tcp, Vu};
//!
//! let (sink, samples) = ChannelSink::channel();
//! let vu = Vu::new(1, Arc::new(sink));
//! let tcp = Tcp::new(&vu, Config::default());
//!
//! let mut conn = tcp.connect("127.0.0.1:7")?;
//! tcp.write(&mut conn, b"ping")?;
//! let echoed = tcp.read(&mut conn, 4, 1000)?;
//! tcp.close(&mut conn)?;
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod metrics;
pub mod module;
pub mod tcp;
pub mod vu;

pub use config::{Config, Limits};
#[cfg(feature = "async-tokio")]
pub use connection::AsyncConnection;
pub use connection::{Connection, ConnectionState};
pub use error::{Error, Result};
pub use metrics::{ChannelSink, MetricsSink, NoopSink, RecordingSink, Sample};
pub use module::{MODULE_NAME, ModuleRegistry, TcpModule};
pub use tcp::Tcp;
pub use vu::{ExecutionContext, Vu};
