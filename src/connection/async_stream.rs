use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, lookup_host};
use tracing::{debug, trace};

use crate::config::Config;
use crate::connection::ConnectionState;
use crate::error::{Error, Result};

/// An async TCP connection handle.
///
/// The async counterpart of [`Connection`](crate::Connection) with the same
/// contract per operation. Read timeouts are applied with
/// `tokio::time::timeout`, so they only ever cover the call that asked for one.
#[derive(Debug)]
pub struct AsyncConnection {
    stream: Option<TcpStream>,
    peer: SocketAddr,
}

impl AsyncConnection {
    /// Dial `addr` (`host:port`) and return an open handle.
    ///
    /// # Errors
    ///
    /// [`Error::Connect`] on resolution failure, refusal or timeout.
    pub async fn connect(addr: &str, config: &Config) -> Result<Self> {
        let addrs = lookup_host(addr).await.map_err(|e| Error::connect(addr, &e))?;

        let mut last_err = None;
        for sock_addr in addrs {
            let attempt = match config.connect_timeout.filter(|t| !t.is_zero()) {
                Some(timeout) => tokio::time::timeout(timeout, TcpStream::connect(sock_addr))
                    .await
                    .unwrap_or_else(|_| {
                        Err(io::Error::new(io::ErrorKind::TimedOut, "connection timed out"))
                    }),
                None => TcpStream::connect(sock_addr).await,
            };
            match attempt {
                Ok(stream) => {
                    stream
                        .set_nodelay(config.nodelay)
                        .map_err(|e| Error::connect(addr, &e))?;
                    let conn = Self::from_stream(stream).map_err(|e| Error::connect(addr, &e))?;
                    debug!(addr = %addr, peer = %conn.peer, "connected");
                    return Ok(conn);
                }
                Err(e) => {
                    trace!(addr = %addr, candidate = %sock_addr, error = %e, "connect attempt failed");
                    last_err = Some(e);
                }
            }
        }

        let err = last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "could not resolve to any addresses",
            )
        });
        Err(Error::connect(addr, &err))
    }

    /// Wrap an already established stream.
    ///
    /// # Errors
    ///
    /// Fails if the stream has no peer address.
    pub fn from_stream(stream: TcpStream) -> io::Result<Self> {
        let peer = stream.peer_addr()?;
        Ok(Self {
            stream: Some(stream),
            peer,
        })
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        if self.stream.is_some() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    /// Check if the connection is open.
    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    /// Remote address this handle was connected to.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    fn stream_mut(&mut self) -> Result<&mut TcpStream> {
        self.stream.as_mut().ok_or(Error::Closed)
    }

    /// Write `data` with a single `send`; may accept fewer bytes.
    pub async fn write(&mut self, data: &[u8]) -> Result<usize> {
        let n = self.stream_mut()?.write(data).await?;
        trace!(requested = data.len(), written = n, "write");
        Ok(n)
    }

    /// Write all of `data`.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.stream_mut()?.write_all(data).await?;
        trace!(written = data.len(), "write_all");
        Ok(())
    }

    /// Read at most `max_size` bytes with a single `recv`.
    ///
    /// Same contract as [`Connection::read`](crate::Connection::read).
    pub async fn read(&mut self, max_size: usize, timeout: Option<Duration>) -> Result<Bytes> {
        let stream = self.stream_mut()?;
        if max_size == 0 {
            return Ok(Bytes::new());
        }

        let mut buf = BytesMut::zeroed(max_size);
        let n = match timeout.filter(|t| !t.is_zero()) {
            Some(timeout) => tokio::time::timeout(timeout, stream.read(&mut buf))
                .await
                .map_err(|_| Error::Timeout(timeout))??,
            None => stream.read(&mut buf).await?,
        };
        if n == 0 {
            trace!(peer = %self.peer, "read on closed peer");
            return Err(Error::peer_closed());
        }

        buf.truncate(n);
        trace!(max_size, received = n, "read");
        Ok(buf.freeze())
    }

    /// Shut the connection down and release the socket. No-op when closed.
    pub async fn close(&mut self) -> Result<()> {
        let Some(mut stream) = self.stream.take() else {
            trace!(peer = %self.peer, "close on closed connection");
            return Ok(());
        };

        debug!(peer = %self.peer, "closing connection");
        match stream.shutdown().await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
