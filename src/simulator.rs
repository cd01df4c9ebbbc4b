//! Paced client workload simulator.
//!
//! Runs the client side of the benchmark: one loop iteration per target
//! frame period. Each frame churns the memory-bound working set, sleeps
//! out the remainder of the period, then reports the measured frame time
//! to the aggregator as a single fire-and-forget datagram.
//!
//! Pacing free-runs: the next frame starts at the *current* time, not at
//! `begin + period`, so drift relative to an absolute schedule can
//! accumulate.

use std::io;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::clock::{sleep_interruptible, ClockError, MonoClock};
use crate::config::ClientConfig;
use crate::net::{Endpoint, UdpSocket};
use crate::wire::{ClientId, FrameReport};
use crate::workload::WorkSet;

/// Errors from the client role. All of them are fatal: UDP loss is
/// tolerated silently at the protocol level, but a local transport failure
/// is not recoverable.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Socket creation or bind failed.
    #[error("socket setup failed: {0}")]
    Setup(io::Error),
    /// Sending a report failed with something other than a full buffer.
    #[error("report send failed: {0}")]
    Send(io::Error),
    /// The paced sleep failed for a reason other than interruption.
    #[error(transparent)]
    Sleep(#[from] ClockError),
}

/// Returns how long to sleep to fill the frame period, if any.
///
/// `None` means the busy work overran the period; the frame is reported
/// as-is with no attempt to catch up.
const fn remaining_sleep(period_ns: u64, useful_work_ns: u64) -> Option<Duration> {
    if useful_work_ns < period_ns {
        Some(Duration::from_nanos(period_ns - useful_work_ns))
    } else {
        None
    }
}

/// The client frame loop: workload, pacing, and report transmission.
pub struct WorkloadSimulator {
    socket: UdpSocket,
    dest: Endpoint,
    clock: MonoClock,
    workset: WorkSet,
    client: ClientId,
    period_ns: u64,
    frame_number: u64,
    begin_frame_ns: u64,
}

impl WorkloadSimulator {
    /// Creates a simulator with a fresh random identity.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Setup`] if the socket cannot be created.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let socket = UdpSocket::bind(Endpoint::any(0)).map_err(ClientError::Setup)?;
        let clock = MonoClock::new();
        let begin_frame_ns = clock.now_ns();

        Ok(Self {
            socket,
            dest: config.server,
            clock,
            workset: WorkSet::new(),
            client: ClientId::generate(),
            period_ns: config.frame_period_ns(),
            frame_number: 0,
            begin_frame_ns,
        })
    }

    /// This process's fixed identity.
    #[must_use]
    pub const fn client_id(&self) -> ClientId {
        self.client
    }

    /// Runs the frame loop until a fatal error.
    pub fn run(&mut self) -> Result<(), ClientError> {
        info!(period_ns = self.period_ns, "frame loop started");
        self.begin_frame_ns = self.clock.now_ns();
        loop {
            self.step()?;
        }
    }

    /// Executes exactly one frame: churn, pace, measure, report.
    ///
    /// # Errors
    ///
    /// Returns an error on sleep or send failure; both are fatal.
    pub fn step(&mut self) -> Result<(), ClientError> {
        self.workset.churn();

        let useful_work_ns = self.clock.now_ns() - self.begin_frame_ns;
        if let Some(remainder) = remaining_sleep(self.period_ns, useful_work_ns) {
            sleep_interruptible(remainder)?;
        }

        let report = FrameReport {
            client: self.client,
            frame_time_ns: self.clock.now_ns() - self.begin_frame_ns,
            frame_number: self.frame_number,
        };
        self.send(&report)?;

        self.frame_number += 1;
        self.begin_frame_ns = self.clock.now_ns();
        Ok(())
    }

    /// Fire-and-forget transmission of one report.
    fn send(&self, report: &FrameReport) -> Result<(), ClientError> {
        match self
            .socket
            .try_send_to(&report.encode(), self.dest)
            .map_err(ClientError::Send)?
        {
            Some(_) => Ok(()),
            None => {
                // Kernel buffer full: indistinguishable from network loss
                // downstream, so the report is dropped, not retried.
                debug!(frame = report.frame_number, "send buffer full, report dropped");
                Ok(())
            }
        }
    }
}
