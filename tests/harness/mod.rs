//! Test harness utilities for socket facade integration tests.
//!
//! Provides loopback peers with fixed behaviors and a helper to build a
//! facade wired to a recording sink.

#![allow(dead_code)]

mod server;

pub use server::{Behavior, TestServer};

use rstcp::{Config, ExecutionContext, RecordingSink, Tcp, Vu};
use std::sync::Arc;

/// A facade for VU `id` recording into a fresh sink.
pub fn facade(id: u64, config: Config) -> (Tcp, Arc<RecordingSink>, ExecutionContext) {
    let sink = Arc::new(RecordingSink::new());
    let ctx = ExecutionContext::new();
    let vu = Vu::with_context(id, ctx.clone(), sink.clone());
    (Tcp::new(&vu, config), sink, ctx)
}
