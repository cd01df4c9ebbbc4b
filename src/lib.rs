//! Distributed synthetic-load benchmark harness.
//!
//! Many client processes simulate a fixed-rate frame producer
//! ([`simulator::WorkloadSimulator`]) and report per-frame timing over UDP
//! to a central aggregator ([`aggregator::Aggregator`]), which maintains
//! online statistics over frame times and per-client inter-arrival deltas
//! and prints a fleet-wide report at a fixed cadence.

pub mod aggregator;
pub mod clock;
pub mod config;
pub mod net;
pub mod registry;
pub mod simulator;
pub mod stats;
pub mod trace;
pub mod wire;
pub mod workload;

pub use aggregator::Aggregator;
pub use config::{ClientConfig, ServerConfig};
pub use simulator::WorkloadSimulator;
pub use wire::{ClientId, FrameReport};
