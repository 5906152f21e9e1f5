//! The socket facade exposed to scripts.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::config::Config;
use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::metrics::{self, DATA_RECEIVED, DATA_SENT, MetricsSink, Sample};
use crate::vu::{ExecutionContext, Vu};

#[cfg(feature = "async-tokio")]
use crate::connection::AsyncConnection;

/// Raw TCP primitives bound to one virtual user.
///
/// `Tcp` holds no connection state. Every operation takes the caller's
/// handle, performs one transfer on it and, for writes, pushes one
/// `data_sent` sample to the VU's sink. Sample delivery never fails an
/// operation.
///
/// `write` always transfers the whole payload (looping over short writes),
/// so the recorded value is both the requested and the transmitted length.
/// Use [`Connection::write`] directly for single-`send` semantics.
///
/// # Example
///
/// ```rust,ignore
/// use rstcp::{Config, Tcp, Vu};
///
/// let tcp = Tcp::new(&vu, Config::default());
/// let mut conn = tcp.connect("127.0.0.1:7")?;
/// tcp.write_line(&mut conn, b"ping")?;
/// let reply = tcp.read(&mut conn, 1024, 500)?;
/// tcp.close(&mut conn)?;
/// ```
#[derive(Clone)]
pub struct Tcp {
    config: Config,
    vu: u64,
    context: ExecutionContext,
    samples: Arc<dyn MetricsSink>,
}

impl Tcp {
    /// Create a facade recording into `vu`'s sink.
    pub fn new(vu: &Vu, config: Config) -> Self {
        Self {
            config,
            vu: vu.id(),
            context: vu.context().clone(),
            samples: Arc::clone(vu.samples()),
        }
    }

    /// Get the facade configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn record(&self, metric: &'static str, bytes: usize) {
        metrics::push_if_not_done(
            &self.context,
            self.samples.as_ref(),
            Sample::new(metric, bytes, self.vu),
        );
    }

    fn read_timeout(timeout_ms: u64) -> Option<Duration> {
        (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms))
    }

    /// Open a TCP connection to `addr` (`host:port`).
    ///
    /// # Errors
    ///
    /// [`Error::Connect`](crate::Error::Connect) if dialing fails. Never retried.
    pub fn connect(&self, addr: &str) -> Result<Connection> {
        Connection::connect(addr, &self.config)
    }

    /// Write all of `data` and record a `data_sent` sample of `data.len()`.
    ///
    /// # Errors
    ///
    /// I/O errors from the transport, or [`Error::Closed`](crate::Error::Closed).
    /// No sample is recorded on failure.
    pub fn write(&self, conn: &mut Connection, data: &[u8]) -> Result<()> {
        conn.write_all(data)?;
        self.record(DATA_SENT, data.len());
        Ok(())
    }

    /// Read at most `max_size` bytes with one `recv`.
    ///
    /// `timeout_ms == 0` waits without a deadline; otherwise the deadline
    /// applies to this call only.
    ///
    /// # Errors
    ///
    /// - [`Error::Closed`](crate::Error::Closed) after `close`, whatever `max_size` is
    /// - [`Error::InvalidArgument`](crate::Error::InvalidArgument) if `max_size` exceeds the read limit
    /// - [`Error::Timeout`](crate::Error::Timeout) if the deadline passes
    /// - [`Error::Io`](crate::Error::Io) from the transport, `UnexpectedEof` once the peer has closed
    pub fn read(&self, conn: &mut Connection, max_size: usize, timeout_ms: u64) -> Result<Bytes> {
        if !conn.is_open() {
            return Err(Error::Closed);
        }
        self.config.limits.check_read_size(max_size)?;
        let data = conn.read(max_size, Self::read_timeout(timeout_ms))?;
        if self.config.track_reads && !data.is_empty() {
            self.record(DATA_RECEIVED, data.len());
        }
        Ok(data)
    }

    /// Write `data` followed by a single `\n`.
    ///
    /// The caller's buffer is left untouched; embedded newlines are sent as-is.
    pub fn write_line(&self, conn: &mut Connection, data: &[u8]) -> Result<()> {
        self.write(conn, &with_newline(data))
    }

    /// Close the connection. Closing twice is a no-op.
    pub fn close(&self, conn: &mut Connection) -> Result<()> {
        conn.close()
    }
}

#[cfg(feature = "async-tokio")]
impl Tcp {
    /// Async [`connect`](Self::connect).
    pub async fn connect_async(&self, addr: &str) -> Result<AsyncConnection> {
        AsyncConnection::connect(addr, &self.config).await
    }

    /// Async [`write`](Self::write).
    pub async fn write_async(&self, conn: &mut AsyncConnection, data: &[u8]) -> Result<()> {
        conn.write_all(data).await?;
        self.record(DATA_SENT, data.len());
        Ok(())
    }

    /// Async [`read`](Self::read).
    pub async fn read_async(
        &self,
        conn: &mut AsyncConnection,
        max_size: usize,
        timeout_ms: u64,
    ) -> Result<Bytes> {
        if !conn.is_open() {
            return Err(Error::Closed);
        }
        self.config.limits.check_read_size(max_size)?;
        let data = conn.read(max_size, Self::read_timeout(timeout_ms)).await?;
        if self.config.track_reads && !data.is_empty() {
            self.record(DATA_RECEIVED, data.len());
        }
        Ok(data)
    }

    /// Async [`write_line`](Self::write_line).
    pub async fn write_line_async(&self, conn: &mut AsyncConnection, data: &[u8]) -> Result<()> {
        self.write_async(conn, &with_newline(data)).await
    }

    /// Async [`close`](Self::close).
    pub async fn close_async(&self, conn: &mut AsyncConnection) -> Result<()> {
        conn.close().await
    }
}

impl fmt::Debug for Tcp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tcp")
            .field("config", &self.config)
            .field("vu", &self.vu)
            .finish_non_exhaustive()
    }
}

fn with_newline(data: &[u8]) -> Vec<u8> {
    let mut line = Vec::with_capacity(data.len() + 1);
    line.extend_from_slice(data);
    line.push(b'\n');
    line
}
