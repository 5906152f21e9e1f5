//! Facade walkthrough against a local echo server.
//!
//! Run with: cargo run --example echo_client
//!
//! Starts an echo server on a random port, drives it through the `x/tcp`
//! module the way a script would, and prints the samples the VU recorded.

use rstcp::module::MODULE_NAME;
use rstcp::{ChannelSink, Config, ModuleRegistry, Tcp, TcpModule, Vu};
use std::error::Error;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?.to_string();
    println!("Echo server listening on {}", addr);

    tokio::spawn(async move {
        loop {
            let Ok((stream, peer)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                if let Err(e) = echo(stream).await {
                    eprintln!("Connection error from {}: {}", peer, e);
                }
            });
        }
    });

    let (sink, mut samples) = ChannelSink::channel();
    let mut registry = ModuleRegistry::new();
    registry.register(
        MODULE_NAME,
        Box::new(TcpModule::new(Config::new().with_track_reads(true))),
    )?;

    let vu = Vu::new(1, Arc::new(sink));
    let addr_for_vu = addr.clone();
    tokio::task::spawn_blocking(move || -> rstcp::Result<()> {
        let instance = registry.instantiate(MODULE_NAME, &vu)?;
        let exports = instance.exports();
        let Some(tcp) = exports.default_as::<Tcp>() else {
            return Ok(());
        };

        let mut conn = tcp.connect(&addr_for_vu)?;
        tcp.write_line(&mut conn, b"hello")?;
        let reply = tcp.read(&mut conn, 1024, 1000)?;
        println!("  Received: {:?}", String::from_utf8_lossy(&reply));

        match tcp.read(&mut conn, 1024, 100) {
            Err(e) if e.is_timeout() => println!("  Nothing more within 100ms"),
            other => println!("  Unexpected: {:?}", other),
        }

        tcp.close(&mut conn)?;
        println!("  Closed: {}", conn.state());
        Ok(())
    })
    .await??;

    while let Ok(sample) = samples.try_recv() {
        println!("  sample vu={} {}={}", sample.vu, sample.metric, sample.value);
    }
    Ok(())
}

async fn echo(mut stream: TcpStream) -> std::io::Result<()> {
    let mut buf = [0u8; 4096];
    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        stream.write_all(&buf[..n]).await?;
    }
}
