//! Configuration for the client and server roles.
//!
//! Defaults reproduce the benchmark's canonical deployment: clients pace at
//! 30 Hz against a server on port 56636 that reports every 30 seconds.
//! Everything is overridable from the command line.

use std::time::Duration;

use crate::net::Endpoint;

/// Default UDP port the server listens on and clients report to.
pub const DEFAULT_PORT: u16 = 56636;

/// Default client frame rate, Hz.
pub const DEFAULT_RATE_HZ: u64 = 30;

/// Default bookkeeping interval; also the client eviction window.
pub const DEFAULT_BOOKKEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Client-role configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Where frame reports are sent.
    pub server: Endpoint,

    /// Target frame rate, Hz. The frame period is `1e9 / rate_hz` ns.
    pub rate_hz: u64,
}

impl ClientConfig {
    /// Creates a configuration with validation.
    ///
    /// # Panics
    ///
    /// Panics if `rate_hz == 0`.
    #[must_use]
    pub fn new(server: Endpoint, rate_hz: u64) -> Self {
        assert!(rate_hz > 0, "rate_hz must be > 0");
        Self { server, rate_hz }
    }

    /// Builder-style setter for the report destination.
    #[must_use]
    pub fn with_server(mut self, server: Endpoint) -> Self {
        self.server = server;
        self
    }

    /// Builder-style setter for the frame rate.
    ///
    /// # Panics
    ///
    /// Panics if `rate_hz == 0`.
    #[must_use]
    pub fn with_rate(mut self, rate_hz: u64) -> Self {
        assert!(rate_hz > 0, "rate_hz must be > 0");
        self.rate_hz = rate_hz;
        self
    }

    /// Target frame period in nanoseconds.
    #[must_use]
    pub const fn frame_period_ns(&self) -> u64 {
        1_000_000_000 / self.rate_hz
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(Endpoint::localhost(DEFAULT_PORT), DEFAULT_RATE_HZ)
    }
}

/// Server-role configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the report socket binds to.
    pub bind: Endpoint,

    /// How often bookkeeping runs: stats report, interval reset, eviction.
    ///
    /// This one constant is also the staleness threshold, so a silent
    /// client may survive up to roughly twice the interval before its
    /// removal lands on a bookkeeping cycle.
    pub bookkeep_interval: Duration,

    /// Requested socket receive buffer size, bytes. `None` keeps the
    /// system default.
    pub recv_buffer: Option<usize>,
}

impl ServerConfig {
    /// Builder-style setter for the bind address.
    #[must_use]
    pub fn with_bind(mut self, bind: Endpoint) -> Self {
        self.bind = bind;
        self
    }

    /// Builder-style setter for the bookkeeping interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.bookkeep_interval = interval;
        self
    }

    /// Builder-style setter for the receive buffer size.
    #[must_use]
    pub fn with_recv_buffer(mut self, bytes: usize) -> Self {
        self.recv_buffer = Some(bytes);
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: Endpoint::any(DEFAULT_PORT),
            bookkeep_interval: DEFAULT_BOOKKEEP_INTERVAL,
            recv_buffer: None,
        }
    }
}
