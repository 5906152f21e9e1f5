//! Configuration and limits for socket facades.

use std::time::Duration;

/// Resource limits applied by the facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Largest `max_size` a single read may request, in bytes.
    ///
    /// The read buffer is allocated up front, so this bounds per-call memory.
    ///
    /// Default: 16 MB (16 * 1024 * 1024)
    pub max_read_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_read_size: 16 * 1024 * 1024, // 16 MB
        }
    }
}

impl Limits {
    /// Create new limits with custom values.
    #[must_use]
    pub const fn new(max_read_size: usize) -> Self {
        Self { max_read_size }
    }

    /// Validate that a requested read size is within limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument) if `size` exceeds the configured maximum.
    pub fn check_read_size(&self, size: usize) -> Result<(), crate::Error> {
        if size > self.max_read_size {
            Err(crate::Error::InvalidArgument(format!(
                "read size {} exceeds limit of {} bytes",
                size, self.max_read_size
            )))
        } else {
            Ok(())
        }
    }
}

/// Socket facade configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Resource limits.
    pub limits: Limits,

    /// Per-address connect timeout.
    ///
    /// If `None` or zero, the platform dialer's default applies.
    /// Default: None
    pub connect_timeout: Option<Duration>,

    /// Set `TCP_NODELAY` on new connections.
    ///
    /// Default: true
    pub nodelay: bool,

    /// Record a `data_received` sample for every non-empty read.
    ///
    /// Default: false
    pub track_reads: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            connect_timeout: None,
            nodelay: true,
            track_reads: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom limits.
    #[must_use]
    pub const fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the per-address connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Enable or disable `TCP_NODELAY` on new connections.
    #[must_use]
    pub const fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Enable or disable `data_received` samples on reads.
    #[must_use]
    pub const fn with_track_reads(mut self, track: bool) -> Self {
        self.track_reads = track;
        self
    }
}
