//! Online timing statistics.
//!
//! [`StatsAccumulator`] maintains running mean/variance via Welford's
//! algorithm plus min/max, in constant space per metric. The aggregator
//! keeps two instances per tracked metric: an all-time one that never
//! resets and an interval one that resets at every bookkeeping cycle.

/// Online mean/variance/min/max estimator.
///
/// Values are fed as `f64`; the aggregator feeds nanoseconds. The zero
/// state (all fields zero) is both the initial and the post-reset state;
/// min/max only become meaningful again once the first sample after a
/// reset overwrites them.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsAccumulator {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl StatsAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one observation into the running statistics.
    pub fn record(&mut self, value: f64) {
        self.count += 1;

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);

        if self.count > 1 {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        } else {
            // First sample overwrites unconditionally, clearing any
            // stale min/max left over from before a reset.
            self.min = value;
            self.max = value;
        }
    }

    /// Returns the accumulator to the zero state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Number of observations folded in since creation or the last reset.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Derives the presentation values from the running state.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        let variance = if self.count > 1 {
            self.m2 / (self.count - 1) as f64
        } else {
            0.0
        };
        let std_dev = variance.sqrt();

        // Guard against division by a near-zero mean
        let rel_std_dev = if self.mean * self.mean > 1e-4 {
            100.0 * std_dev / self.mean
        } else {
            0.0
        };

        StatsSnapshot {
            count: self.count,
            mean: self.mean,
            variance,
            std_dev,
            rel_std_dev,
            min: self.min,
            max: self.max,
        }
    }
}

/// Point-in-time derived view of a [`StatsAccumulator`].
///
/// Variance uses Bessel's correction (n−1); relative standard deviation is
/// a percentage of the mean.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatsSnapshot {
    pub count: u64,
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub rel_std_dev: f64,
    pub min: f64,
    pub max: f64,
}
