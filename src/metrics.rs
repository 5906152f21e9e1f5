//! Byte-transfer samples and the sinks that receive them.
//!
//! The facade never aggregates: it builds one [`Sample`] per successful
//! transfer and hands it to a [`MetricsSink`] through [`push_if_not_done`].
//! Pushing is fire-and-forget. A sample for an execution that has already
//! finished is dropped, and a sink whose consumer is gone drops silently.
//!
//! # Example
//!
//! ```rust,ignore
//! use rstcp::metrics::{ChannelSink, DATA_SENT};
//!
//! let (sink, mut rx) = ChannelSink::channel();
//! // ... hand `Arc::new(sink)` to a Vu ...
//! while let Ok(sample) = rx.try_recv() {
//!     assert_eq!(sample.metric, DATA_SENT);
//! }
//! ```

use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

use tokio::sync::mpsc;
use tracing::trace;

use crate::vu::ExecutionContext;

/// Metric name for bytes written to a connection.
pub const DATA_SENT: &str = "data_sent";

/// Metric name for bytes read from a connection.
pub const DATA_RECEIVED: &str = "data_received";

/// A single metric observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Metric name, one of [`DATA_SENT`] or [`DATA_RECEIVED`].
    pub metric: &'static str,
    /// Wall-clock time the transfer completed.
    pub time: SystemTime,
    /// Number of bytes transferred.
    pub value: f64,
    /// Id of the VU that performed the transfer.
    pub vu: u64,
}

impl Sample {
    /// Create a sample stamped with the current time.
    pub fn new(metric: &'static str, bytes: usize, vu: u64) -> Self {
        Self {
            metric,
            time: SystemTime::now(),
            value: bytes as f64,
            vu,
        }
    }
}

/// Receiver of samples.
///
/// Implementations must not block and must not panic; a sink that cannot
/// accept a sample drops it.
pub trait MetricsSink: Send + Sync {
    /// Hand over one sample.
    fn push(&self, sample: Sample);
}

/// Push `sample` unless `ctx` has finished.
///
/// Returns whether the sample was handed to the sink.
pub fn push_if_not_done(ctx: &ExecutionContext, sink: &dyn MetricsSink, sample: Sample) -> bool {
    if ctx.is_done() {
        trace!(metric = sample.metric, "execution finished, sample dropped");
        return false;
    }
    sink.push(sample);
    true
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn push(&self, _sample: Sample) {}
}

/// Sink forwarding samples to an unbounded channel, the host's collector
/// owning the receiving end.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Sample>,
}

impl ChannelSink {
    /// Create a sink and the receiver its samples arrive on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Sample>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Check whether the receiver has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl MetricsSink for ChannelSink {
    fn push(&self, sample: Sample) {
        if let Err(mpsc::error::SendError(sample)) = self.tx.send(sample) {
            trace!(metric = sample.metric, "collector gone, sample dropped");
        }
    }
}

/// Sink that keeps every sample in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    samples: Mutex<Vec<Sample>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded samples, in push order.
    pub fn samples(&self) -> Vec<Sample> {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded samples.
    pub fn len(&self) -> usize {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of the values recorded for `metric`.
    pub fn total(&self, metric: &str) -> f64 {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.metric == metric)
            .map(|s| s.value)
            .sum()
    }
}

impl MetricsSink for RecordingSink {
    fn push(&self, sample: Sample) {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sample);
    }
}
