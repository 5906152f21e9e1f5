//! Virtual-user context the facade is bound to.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::metrics::MetricsSink;

/// Lifetime flag of one execution (an iteration, a test run).
///
/// Clones share the flag. Once [`finish`](Self::finish) is called on any
/// clone, samples pushed through this context are dropped.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    done: Arc<AtomicBool>,
}

impl ExecutionContext {
    /// Create a live context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the execution as finished.
    pub fn finish(&self) {
        self.done.store(true, Ordering::Release);
    }

    /// Check whether the execution has finished.
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }
}

/// One virtual user of the host: its id, execution context and sample sink.
#[derive(Clone)]
pub struct Vu {
    id: u64,
    context: ExecutionContext,
    samples: Arc<dyn MetricsSink>,
}

impl Vu {
    /// Create a VU with a fresh execution context.
    pub fn new(id: u64, samples: Arc<dyn MetricsSink>) -> Self {
        Self::with_context(id, ExecutionContext::new(), samples)
    }

    /// Create a VU bound to an existing execution context.
    pub fn with_context(id: u64, context: ExecutionContext, samples: Arc<dyn MetricsSink>) -> Self {
        Self {
            id,
            context,
            samples,
        }
    }

    /// VU id, stamped on every sample.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Execution context of this VU.
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// Sample sink of this VU.
    pub fn samples(&self) -> &Arc<dyn MetricsSink> {
        &self.samples
    }
}

impl fmt::Debug for Vu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vu")
            .field("id", &self.id)
            .field("done", &self.context.is_done())
            .finish_non_exhaustive()
    }
}
