use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::connection::ConnectionState;
use crate::error::{Error, Result};

/// A blocking TCP connection handle.
///
/// Each method performs one operation on the underlying stream and returns.
/// Nothing is buffered: bytes written are handed straight to the socket, and
/// a read returns whatever a single `recv` produced.
///
/// Closing releases the socket immediately. The handle itself stays valid
/// as a value and reports [`ConnectionState::Closed`]; any further I/O on it
/// fails with [`Error::Closed`].
#[derive(Debug)]
pub struct Connection {
    stream: Option<TcpStream>,
    peer: SocketAddr,
}

impl Connection {
    /// Dial `addr` (`host:port`) and return an open handle.
    ///
    /// Every address the name resolves to is tried in order; the first that
    /// accepts wins. With a non-zero [`Config::connect_timeout`], each attempt
    /// is bounded by it; a zero timeout leaves the platform default in place.
    ///
    /// # Errors
    ///
    /// [`Error::Connect`] on resolution failure, refusal or timeout. The
    /// error carries the last attempt's cause.
    pub fn connect(addr: &str, config: &Config) -> Result<Self> {
        let addrs = addr.to_socket_addrs().map_err(|e| Error::connect(addr, &e))?;

        let mut last_err = None;
        for sock_addr in addrs {
            let attempt = match config.connect_timeout.filter(|t| !t.is_zero()) {
                Some(timeout) => TcpStream::connect_timeout(&sock_addr, timeout),
                None => TcpStream::connect(sock_addr),
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
    /// Fails if the stream has no peer address (e.g. it is not connected).
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

    /// Local address of the socket.
    ///
    /// # Errors
    ///
    /// [`Error::Closed`] after `close`.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        let stream = self.stream.as_ref().ok_or(Error::Closed)?;
        Ok(stream.local_addr()?)
    }

    fn stream_mut(&mut self) -> Result<&mut TcpStream> {
        self.stream.as_mut().ok_or(Error::Closed)
    }

    /// Write `data` with a single `send` and return how many bytes the
    /// transport accepted, which may be fewer than `data.len()`.
    ///
    /// # Errors
    ///
    /// [`Error::Closed`] after `close`, [`Error::Io`] from the transport.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        let n = self.stream_mut()?.write(data)?;
        trace!(requested = data.len(), written = n, "write");
        Ok(n)
    }

    /// Write all of `data`, issuing as many `send`s as the transport needs.
    ///
    /// # Errors
    ///
    /// [`Error::Closed`] after `close`, [`Error::Io`] from the transport. On
    /// error an unknown prefix of `data` may already have been sent.
    pub fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.stream_mut()?.write_all(data)?;
        trace!(written = data.len(), "write_all");
        Ok(())
    }

    /// Read at most `max_size` bytes with a single `recv`.
    ///
    /// With `timeout`, the socket's read timeout is set for this call only and
    /// cleared again before returning, whatever the outcome. A zero timeout is
    /// the same as `None`. `max_size == 0` returns an empty payload without
    /// touching the socket.
    ///
    /// # Errors
    ///
    /// - [`Error::Closed`] after `close`
    /// - [`Error::Timeout`] if the deadline passed with no data
    /// - [`Error::Io`] of kind `UnexpectedEof` once the peer has closed
    /// - [`Error::Io`] from the transport
    pub fn read(&mut self, max_size: usize, timeout: Option<Duration>) -> Result<Bytes> {
        let stream = self.stream_mut()?;
        if max_size == 0 {
            return Ok(Bytes::new());
        }

        let mut buf = BytesMut::zeroed(max_size);
        let n = match timeout.filter(|t| !t.is_zero()) {
            Some(timeout) => {
                stream.set_read_timeout(Some(timeout))?;
                let result = read_once(stream, &mut buf);
                if let Err(e) = stream.set_read_timeout(None) {
                    warn!(error = %e, "failed to clear read timeout");
                }
                result.map_err(|e| match e.kind() {
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Error::Timeout(timeout),
                    _ => e.into(),
                })?
            }
            None => read_once(stream, &mut buf)?,
        };
        if n == 0 {
            trace!(peer = %self.peer, "read on closed peer");
            return Err(Error::peer_closed());
        }

        buf.truncate(n);
        trace!(max_size, received = n, "read");
        Ok(buf.freeze())
    }

    /// Shut the connection down and release the socket.
    ///
    /// Closing an already closed handle is a no-op.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the transport reports a shutdown failure other than
    /// the peer already being gone. The handle is closed either way.
    pub fn close(&mut self) -> Result<()> {
        let Some(stream) = self.stream.take() else {
            trace!(peer = %self.peer, "close on closed connection");
            return Ok(());
        };

        debug!(peer = %self.peer, "closing connection");
        match stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn read_once(stream: &mut TcpStream, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    fn pair() -> (Connection, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let conn = Connection::connect(&addr, &Config::default()).unwrap();
        let (peer, _) = listener.accept().unwrap();
        (conn, peer)
    }

    #[test]
    fn test_connect_is_open() {
        let (conn, peer) = pair();
        assert!(conn.is_open());
        assert_eq!(conn.state(), ConnectionState::Open);
        assert_eq!(conn.peer_addr(), peer.local_addr().unwrap());
    }

    #[test]
    fn test_write_all_reaches_peer() {
        let (mut conn, mut peer) = pair();
        conn.write_all(b"hello").unwrap();

        let mut buf = [0u8; 5];
        peer.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn test_single_write_reports_count() {
        let (mut conn, mut peer) = pair();
        let n = conn.write(b"abc").unwrap();
        assert_eq!(n, 3);

        let mut buf = [0u8; 3];
        peer.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"abc");
    }

    #[test]
    fn test_read_returns_only_received_bytes() {
        let (mut conn, mut peer) = pair();
        peer.write_all(b"xyz").unwrap();

        let data = conn.read(64, None).unwrap();
        assert_eq!(&data[..], b"xyz");
    }

    #[test]
    fn test_read_zero_size() {
        let (mut conn, _peer) = pair();
        let data = conn.read(0, Some(Duration::from_millis(10))).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_read_after_peer_close_fails() {
        let (mut conn, peer) = pair();
        drop(peer);

        for _ in 0..3 {
            let err = conn.read(16, Some(Duration::from_secs(5))).unwrap_err();
            assert_eq!(err, Error::peer_closed());
            assert!(err.is_io());
        }
        let err = conn.read(16, None).unwrap_err();
        assert_eq!(err.io_kind(), Some(io::ErrorKind::UnexpectedEof));
        assert!(conn.is_open());
    }

    #[test]
    fn test_read_timeout() {
        let (mut conn, _peer) = pair();
        let timeout = Duration::from_millis(50);
        let err = conn.read(8, Some(timeout)).unwrap_err();
        assert_eq!(err, Error::Timeout(timeout));
        assert!(err.is_io());
    }

    #[test]
    fn test_read_timeout_is_cleared() {
        let (mut conn, mut peer) = pair();

        let err = conn.read(8, Some(Duration::from_millis(30))).unwrap_err();
        assert!(err.is_timeout());
        let stream = conn.stream.as_ref().unwrap();
        assert_eq!(stream.read_timeout().unwrap(), None);

        let writer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(150));
            peer.write_all(b"late").unwrap();
            peer
        });

        let data = conn.read(8, None).unwrap();
        assert_eq!(&data[..], b"late");
        writer.join().unwrap();
    }

    #[test]
    fn test_timed_read_with_data() {
        let (mut conn, mut peer) = pair();
        peer.write_all(b"ok").unwrap();

        let data = conn.read(8, Some(Duration::from_secs(5))).unwrap();
        assert_eq!(&data[..], b"ok");
        let stream = conn.stream.as_ref().unwrap();
        assert_eq!(stream.read_timeout().unwrap(), None);
    }

    #[test]
    fn test_close_twice_is_noop() {
        let (mut conn, _peer) = pair();
        conn.close().unwrap();
        assert_eq!(conn.state(), ConnectionState::Closed);
        conn.close().unwrap();
        assert!(!conn.is_open());
    }

    #[test]
    fn test_io_after_close_fails() {
        let (mut conn, _peer) = pair();
        conn.close().unwrap();

        assert_eq!(conn.write(b"x"), Err(Error::Closed));
        assert_eq!(conn.write_all(b"x"), Err(Error::Closed));
        assert_eq!(conn.read(4, None), Err(Error::Closed));
        assert_eq!(conn.read(0, None), Err(Error::Closed));
        assert_eq!(conn.local_addr(), Err(Error::Closed));
    }

    #[test]
    fn test_close_signals_eof_to_peer() {
        let (mut conn, mut peer) = pair();
        conn.close().unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(peer.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = Connection::connect(&addr, &Config::default()).unwrap_err();
        assert!(matches!(err, Error::Connect { ref addr, .. } if addr.starts_with("127.0.0.1:")));
    }

    #[test]
    fn test_connect_malformed_address() {
        let err = Connection::connect("no-port-here", &Config::default()).unwrap_err();
        assert!(matches!(err, Error::Connect { .. }));
    }

    #[test]
    fn test_connect_with_timeout_and_nodelay() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let config = Config::new()
            .with_connect_timeout(Duration::from_secs(2))
            .with_nodelay(false);

        let conn = Connection::connect(&addr, &config).unwrap();
        let stream = conn.stream.as_ref().unwrap();
        assert!(!stream.nodelay().unwrap());
    }

    #[test]
    fn test_connect_zero_timeout_uses_default() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let config = Config::new().with_connect_timeout(Duration::ZERO);

        let conn = Connection::connect(&addr, &config).unwrap();
        assert!(conn.is_open());
    }
}
