//! Counters for the mediation layer

pub mod metrics;

pub use metrics::{BridgeCounters, BridgeStats};
