//! Monotonic timing and interruptible sleep.
//!
//! All pacing and liveness decisions use [`MonoClock`], a monotonic,
//! non-wall-clock source with nanosecond resolution. Wall-clock time
//! appears only in the cosmetic timestamp of the server report line.

use std::time::Duration;

use rustix::thread::{nanosleep, NanosleepRelativeResult, Timespec};
use thiserror::Error;

/// Errors from the sleep primitive.
#[derive(Debug, Error)]
pub enum ClockError {
    /// `nanosleep` failed for a reason other than signal interruption.
    #[error("nanosleep failed: {0}")]
    Nanosleep(rustix::io::Errno),
}

/// Monotonic nanosecond clock.
///
/// Timestamps are nanoseconds elapsed since the clock was created; they are
/// only meaningful relative to each other within one process.
#[derive(Debug, Clone, Copy)]
pub struct MonoClock {
    origin: minstant::Instant,
}

impl MonoClock {
    /// Creates a clock anchored at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: minstant::Instant::now(),
        }
    }

    /// Returns nanoseconds elapsed since the clock was created.
    #[must_use]
    pub fn now_ns(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }
}

impl Default for MonoClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Sleeps for at least `duration`, resuming across signal interruptions.
///
/// On interruption the kernel reports the unslept remainder and the sleep
/// resumes for exactly that remainder; it is never restarted from the full
/// duration and never degrades to a busy-wait.
///
/// # Errors
///
/// Returns [`ClockError::Nanosleep`] on any sleep failure other than
/// interruption. Callers treat this as fatal.
pub fn sleep_interruptible(duration: Duration) -> Result<(), ClockError> {
    let mut remaining = Timespec {
        tv_sec: duration.as_secs() as _,
        tv_nsec: duration.subsec_nanos() as _,
    };

    loop {
        match nanosleep(&remaining) {
            NanosleepRelativeResult::Ok => return Ok(()),
            NanosleepRelativeResult::Interrupted(rest) => remaining = rest,
            NanosleepRelativeResult::Err(errno) => return Err(ClockError::Nanosleep(errno)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_monotone() {
        let clock = MonoClock::new();
        let a = clock.now_ns();
        let b = clock.now_ns();
        assert!(b >= a);
    }

    #[test]
    fn sleep_elapses_at_least_requested() {
        let clock = MonoClock::new();
        let before = clock.now_ns();
        sleep_interruptible(Duration::from_millis(10)).unwrap();
        let elapsed = clock.now_ns() - before;
        assert!(elapsed >= 10_000_000, "slept only {elapsed} ns");
    }

    #[test]
    fn zero_sleep_returns_immediately() {
        sleep_interruptible(Duration::ZERO).unwrap();
    }
}
