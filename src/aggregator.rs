//! Server-side report aggregation.
//!
//! Responsibilities:
//! - Receive report datagrams without ever blocking, so periodic
//!   bookkeeping can interleave with reception.
//! - Fold each valid report into the client registry and the four stats
//!   accumulators (arrival-delta and frame-time, all-time and interval).
//! - Discard malformed datagrams without touching any state.
//! - At each bookkeeping cycle: print the fleet report, reset the interval
//!   accumulators, and evict stale clients.
//!
//! The state machine lives in [`Collector`], which is fed explicit
//! monotonic timestamps and never touches a socket; [`Aggregator`] wraps
//! it with the socket, clock, and receive buffer. Everything is owned by
//! one value and mutated from one loop; a bookkeeping report therefore
//! reflects exactly the receives processed before it, with no interleaving.

use std::io;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::clock::MonoClock;
use crate::config::ServerConfig;
use crate::net::{Endpoint, UdpSocket};
use crate::registry::ClientRegistry;
use crate::stats::{StatsAccumulator, StatsSnapshot};
use crate::wire::FrameReport;

/// Maximum UDP datagram size we'll receive.
///
/// Reports are 24 bytes, but the buffer must be large enough to observe
/// the true length of oversized garbage so it can be logged accurately.
const MAX_DATAGRAM_SIZE: usize = 65535;

const NS_PER_MS: f64 = 1_000_000.0;

/// Errors from the server role. Both are fatal.
#[derive(Debug, Error)]
pub enum AggregatorError {
    /// The report socket could not be created or bound.
    #[error("cannot bind report socket: {0}")]
    Bind(io::Error),
    /// A receive failed with something other than "no data available".
    #[error("receive failed: {0}")]
    Recv(io::Error),
}

/// The aggregation state machine: registry, accumulators, peak count.
///
/// All methods take explicit `now_ns` timestamps from the caller's
/// monotonic clock, which keeps the arrival-delta and eviction logic
/// testable with simulated time.
pub struct Collector {
    registry: ClientRegistry,
    arrival_all: StatsAccumulator,
    arrival_interval: StatsAccumulator,
    frame_all: StatsAccumulator,
    frame_interval: StatsAccumulator,
    peak_clients: usize,
    interval_ns: u64,
    last_bookkeep_ns: u64,
}

impl Collector {
    /// Creates an empty collector.
    ///
    /// `interval` is both the bookkeeping cadence and the client eviction
    /// window; `now_ns` starts the first bookkeeping period.
    #[must_use]
    pub fn new(interval: Duration, now_ns: u64) -> Self {
        Self {
            registry: ClientRegistry::new(),
            arrival_all: StatsAccumulator::new(),
            arrival_interval: StatsAccumulator::new(),
            frame_all: StatsAccumulator::new(),
            frame_interval: StatsAccumulator::new(),
            peak_clients: 0,
            interval_ns: interval.as_nanos() as u64,
            last_bookkeep_ns: now_ns,
        }
    }

    /// Folds one valid report, received at monotonic time `now_ns`, into
    /// the registry and accumulators.
    ///
    /// A first contact creates the registry entry but contributes no
    /// arrival-delta sample; the frame time is recorded unconditionally.
    pub fn observe(&mut self, report: &FrameReport, now_ns: u64) {
        match self.registry.observe(report.client, now_ns) {
            Some(delta_ns) => {
                let delta = delta_ns as f64;
                self.arrival_all.record(delta);
                self.arrival_interval.record(delta);
            }
            None => debug!(client = %report.client, "new client"),
        }

        let frame_time = report.frame_time_ns as f64;
        self.frame_all.record(frame_time);
        self.frame_interval.record(frame_time);
    }

    /// Returns `true` once the bookkeeping interval has elapsed.
    #[must_use]
    pub fn bookkeep_due(&self, now_ns: u64) -> bool {
        now_ns - self.last_bookkeep_ns > self.interval_ns
    }

    /// Runs one bookkeeping cycle and returns the report line.
    ///
    /// Order matters: the peak count and report reflect the registry as it
    /// stood when the cycle began; only then are the interval accumulators
    /// reset and stale clients evicted.
    pub fn bookkeep(&mut self, now_ns: u64) -> String {
        self.peak_clients = self.peak_clients.max(self.registry.len());

        let line = self.report_line();

        self.arrival_interval.reset();
        self.frame_interval.reset();

        let evicted = self.registry.evict_stale(now_ns, self.interval_ns);
        if evicted > 0 {
            info!(evicted, remaining = self.registry.len(), "evicted stale clients");
        }

        self.last_bookkeep_ns = now_ns;
        line
    }

    fn report_line(&self) -> String {
        format!(
            "AllTime, Clients, {}, PacketTimes, {}, FrameTimes, {}, \
             Current, Clients, {}, PacketTimes, {}, FrameTimes, {}, {}",
            self.peak_clients,
            fmt_stats_ms(&self.arrival_all.snapshot()),
            fmt_stats_ms(&self.frame_all.snapshot()),
            self.registry.len(),
            fmt_stats_ms(&self.arrival_interval.snapshot()),
            fmt_stats_ms(&self.frame_interval.snapshot()),
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        )
    }

    /// Currently-tracked clients.
    #[must_use]
    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    /// All-time high-water mark of concurrently tracked clients.
    #[must_use]
    pub const fn peak_clients(&self) -> usize {
        self.peak_clients
    }

    /// All-time inter-arrival delta statistics, nanoseconds.
    #[must_use]
    pub const fn arrival_all(&self) -> &StatsAccumulator {
        &self.arrival_all
    }

    /// Current-interval inter-arrival delta statistics, nanoseconds.
    #[must_use]
    pub const fn arrival_interval(&self) -> &StatsAccumulator {
        &self.arrival_interval
    }

    /// All-time frame-time statistics, nanoseconds.
    #[must_use]
    pub const fn frame_all(&self) -> &StatsAccumulator {
        &self.frame_all
    }

    /// Current-interval frame-time statistics, nanoseconds.
    #[must_use]
    pub const fn frame_interval(&self) -> &StatsAccumulator {
        &self.frame_interval
    }
}

/// Formats a nanosecond-fed snapshot as milliseconds for the report line.
fn fmt_stats_ms(snapshot: &StatsSnapshot) -> String {
    format!(
        "Min(ms), {:.3}, Max(ms), {:.3}, Mean(ms), {:.3}, StdDev(ms), {:.3}, \
         RelStdDev(%), {:.1}, DataSize, {}",
        snapshot.min / NS_PER_MS,
        snapshot.max / NS_PER_MS,
        snapshot.mean / NS_PER_MS,
        snapshot.std_dev / NS_PER_MS,
        snapshot.rel_std_dev,
        snapshot.count,
    )
}

/// The server: a non-blocking receive loop wrapped around a [`Collector`].
pub struct Aggregator {
    socket: UdpSocket,
    clock: MonoClock,
    collector: Collector,
    recv_buf: Vec<u8>,
}

impl Aggregator {
    /// Binds the report socket and creates an empty collector.
    ///
    /// # Errors
    ///
    /// Returns [`AggregatorError::Bind`] if the socket cannot be bound or
    /// the requested receive buffer cannot be set.
    pub fn new(config: &ServerConfig) -> Result<Self, AggregatorError> {
        let socket = UdpSocket::bind(config.bind).map_err(AggregatorError::Bind)?;
        if let Some(bytes) = config.recv_buffer {
            socket
                .set_recv_buffer_size(bytes)
                .map_err(AggregatorError::Bind)?;
        }

        let clock = MonoClock::new();
        let collector = Collector::new(config.bookkeep_interval, clock.now_ns());

        Ok(Self {
            socket,
            clock,
            collector,
            recv_buf: vec![0u8; MAX_DATAGRAM_SIZE],
        })
    }

    /// Returns the bound address of the report socket.
    ///
    /// # Errors
    ///
    /// Returns an error if the local address cannot be retrieved.
    pub fn local_addr(&self) -> io::Result<Endpoint> {
        self.socket.local_addr()
    }

    /// Read access to the aggregation state.
    #[must_use]
    pub fn collector(&self) -> &Collector {
        &self.collector
    }

    /// Runs the receive/bookkeep loop until a fatal error.
    pub fn run(&mut self) -> Result<(), AggregatorError> {
        let addr = self.local_addr().map_err(AggregatorError::Bind)?;
        info!(addr = %addr, "aggregator listening");
        loop {
            self.poll_once()?;
        }
    }

    /// One loop iteration: at most one receive attempt, then the
    /// bookkeeping check.
    ///
    /// Returns `true` if a datagram (valid or not) was consumed, `false`
    /// if the socket was idle.
    ///
    /// # Errors
    ///
    /// Returns [`AggregatorError::Recv`] on any receive failure other
    /// than "no data available".
    pub fn poll_once(&mut self) -> Result<bool, AggregatorError> {
        let consumed = match self
            .socket
            .try_recv_from(&mut self.recv_buf)
            .map_err(AggregatorError::Recv)?
        {
            Some((len, from)) => {
                self.ingest(len, from);
                true
            }
            None => false,
        };

        let now_ns = self.clock.now_ns();
        if self.collector.bookkeep_due(now_ns) {
            let line = self.collector.bookkeep(now_ns);
            println!("{line}");
        }

        Ok(consumed)
    }

    /// Decodes and folds in one received datagram; malformed input is
    /// logged and dropped with no state change.
    fn ingest(&mut self, len: usize, from: Endpoint) {
        match FrameReport::decode(&self.recv_buf[..len]) {
            Ok(report) => {
                trace!(
                    client = %report.client,
                    frame = report.frame_number,
                    frame_time_ns = report.frame_time_ns,
                    "report received"
                );
                self.collector.observe(&report, self.clock.now_ns());
            }
            Err(e) => warn!(from = %from, "malformed message: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::ClientId;

    const SECOND_NS: u64 = 1_000_000_000;
    const INTERVAL: Duration = Duration::from_secs(30);

    fn report(client: u64, frame_time_ns: u64, frame_number: u64) -> FrameReport {
        FrameReport {
            client: ClientId(client),
            frame_time_ns,
            frame_number,
        }
    }

    #[test]
    fn three_arrivals_scenario() {
        let mut collector = Collector::new(INTERVAL, 0);

        for (i, t) in [0, SECOND_NS, 2 * SECOND_NS].into_iter().enumerate() {
            collector.observe(&report(0x1, 33_333_333, i as u64), t);
        }

        let frames = collector.frame_all().snapshot();
        assert_eq!(frames.count, 3);
        assert_eq!(frames.mean, 33_333_333.0);
        assert_eq!(frames.min, 33_333_333.0);
        assert_eq!(frames.max, 33_333_333.0);
        assert_eq!(frames.std_dev, 0.0);

        let arrivals = collector.arrival_all().snapshot();
        assert_eq!(arrivals.count, 2);
        assert_eq!(arrivals.mean, 1e9);
        assert_eq!(arrivals.min, 1e9);
        assert_eq!(arrivals.max, 1e9);
        assert_eq!(arrivals.std_dev, 0.0);

        // Interval accumulators saw the same traffic
        assert_eq!(collector.frame_interval().count(), 3);
        assert_eq!(collector.arrival_interval().count(), 2);
        assert_eq!(collector.registry().len(), 1);
    }

    #[test]
    fn first_contact_contributes_no_arrival_delta() {
        let mut collector = Collector::new(INTERVAL, 0);
        collector.observe(&report(0xa, 1_000_000, 0), 0);

        assert_eq!(collector.registry().len(), 1);
        assert_eq!(collector.arrival_all().count(), 0);
        assert_eq!(collector.frame_all().count(), 1);
    }

    #[test]
    fn bookkeeping_resets_interval_but_not_all_time() {
        let mut collector = Collector::new(INTERVAL, 0);
        collector.observe(&report(0x1, 10, 0), 0);
        collector.observe(&report(0x1, 20, 1), SECOND_NS);

        collector.bookkeep(31 * SECOND_NS);

        assert_eq!(collector.frame_all().count(), 2);
        assert_eq!(collector.arrival_all().count(), 1);
        assert_eq!(collector.frame_interval().count(), 0);
        assert_eq!(collector.arrival_interval().count(), 0);

        // Post-reset samples re-arm interval min/max at n == 1
        collector.observe(&report(0x1, 5, 2), 32 * SECOND_NS);
        let snap = collector.frame_interval().snapshot();
        assert_eq!(snap.min, 5.0);
        assert_eq!(snap.max, 5.0);
    }

    #[test]
    fn bookkeeping_due_only_after_interval() {
        let collector = Collector::new(INTERVAL, 0);
        assert!(!collector.bookkeep_due(30 * SECOND_NS));
        assert!(collector.bookkeep_due(30 * SECOND_NS + 1));
    }

    #[test]
    fn silent_client_evicted_at_first_cycle_past_window() {
        let mut collector = Collector::new(INTERVAL, 0);
        collector.observe(&report(0x1, 10, 0), 0);

        // First cycle: silence (31s) exceeds the window, client goes
        collector.bookkeep(31 * SECOND_NS);
        assert_eq!(collector.registry().len(), 0);
    }

    #[test]
    fn active_client_survives_bookkeeping() {
        let mut collector = Collector::new(INTERVAL, 0);
        collector.observe(&report(0x1, 10, 0), 0);
        collector.observe(&report(0x1, 10, 1), 20 * SECOND_NS);

        collector.bookkeep(31 * SECOND_NS);
        assert_eq!(collector.registry().len(), 1);

        // Silent since 20s; at the next cycle (62s) it is past the window
        collector.bookkeep(62 * SECOND_NS);
        assert_eq!(collector.registry().len(), 0);
    }

    #[test]
    fn peak_client_count_is_monotone() {
        let mut collector = Collector::new(INTERVAL, 0);
        collector.observe(&report(0x1, 10, 0), 0);
        collector.observe(&report(0x2, 10, 0), 0);

        collector.bookkeep(31 * SECOND_NS);
        assert_eq!(collector.peak_clients(), 2);

        // Both evicted; the high-water mark must not fall
        assert_eq!(collector.registry().len(), 0);
        collector.bookkeep(62 * SECOND_NS + 1);
        assert_eq!(collector.peak_clients(), 2);
    }

    #[test]
    fn report_line_carries_all_sections() {
        let mut collector = Collector::new(INTERVAL, 0);
        collector.observe(&report(0x1, 2_000_000, 0), 0);
        collector.observe(&report(0x1, 2_000_000, 1), SECOND_NS);

        let line = collector.bookkeep(31 * SECOND_NS);

        assert!(line.starts_with("AllTime, Clients, 1, PacketTimes, "));
        assert!(line.contains("Current, Clients, 1, "));
        assert!(line.contains("FrameTimes, "));
        // Frame time of 2ms, and the arrival delta of 1s, in ms
        assert!(line.contains("Mean(ms), 2.000"));
        assert!(line.contains("Mean(ms), 1000.000"));
        assert!(line.contains("DataSize, 2"));
    }

    #[test]
    fn fmt_stats_converts_ns_to_ms() {
        let mut acc = StatsAccumulator::new();
        acc.record(1_500_000.0);
        let rendered = fmt_stats_ms(&acc.snapshot());
        assert_eq!(
            rendered,
            "Min(ms), 1.500, Max(ms), 1.500, Mean(ms), 1.500, StdDev(ms), 0.000, \
             RelStdDev(%), 0.0, DataSize, 1"
        );
    }
}
