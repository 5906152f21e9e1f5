//! Loopback TCP peers on random ports.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// What the server does with each accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Write back everything received.
    Echo,
    /// Accept and never write; hold the socket until the client closes.
    Silent,
    /// Read until EOF and report the bytes on the capture channel.
    Capture,
}

/// A loopback server accepting any number of connections.
pub struct TestServer {
    addr: SocketAddr,
    stop: Arc<AtomicBool>,
    accept_thread: Option<JoinHandle<()>>,
    captured: mpsc::Receiver<Vec<u8>>,
}

impl TestServer {
    /// Bind `127.0.0.1:0` and start accepting.
    pub fn spawn(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let stop = Arc::new(AtomicBool::new(false));
        let (tx, captured) = mpsc::channel();

        let stop_flag = stop.clone();
        let accept_thread = thread::spawn(move || {
            for stream in listener.incoming() {
                if stop_flag.load(Ordering::Acquire) {
                    break;
                }
                let Ok(stream) = stream else { continue };
                let tx = tx.clone();
                thread::spawn(move || handle(stream, behavior, tx));
            }
        });

        Self {
            addr,
            stop,
            accept_thread: Some(accept_thread),
            captured,
        }
    }

    /// Address as a `host:port` string.
    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    /// Bytes received on the next connection that reached EOF (`Capture` only).
    pub fn next_capture(&self) -> Vec<u8> {
        self.captured
            .recv_timeout(Duration::from_secs(5))
            .expect("no capture within 5s")
    }

    /// Stop accepting and join the accept thread.
    pub fn shutdown(mut self) {
        self.stop_accepting();
    }

    fn stop_accepting(&mut self) {
        self.stop.store(true, Ordering::Release);
        // Unblock accept().
        let _ = TcpStream::connect(self.addr);
        if let Some(handle) = self.accept_thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.stop_accepting();
    }
}

fn handle(mut stream: TcpStream, behavior: Behavior, captured: mpsc::Sender<Vec<u8>>) {
    let mut buf = [0u8; 4096];
    match behavior {
        Behavior::Echo => loop {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if stream.write_all(&buf[..n]).is_err() {
                        break;
                    }
                }
            }
        },
        Behavior::Silent => {
            while let Ok(n) = stream.read(&mut buf) {
                if n == 0 {
                    break;
                }
            }
        }
        Behavior::Capture => {
            let mut received = Vec::new();
            if stream.read_to_end(&mut received).is_ok() {
                let _ = captured.send(received);
            }
        }
    }
}
