//! Statistics for a control session

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the session counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Pulses emitted on boolean signals
    pub pulses_sent: u64,
    /// Values written to numeric signals
    pub numeric_writes: u64,
    /// Publishes dropped because the transport was unavailable
    pub publishes_dropped: u64,
    /// Commands accepted by the sequencer
    pub commands_enqueued: u64,
    /// Commands that finished their settle delay
    pub commands_completed: u64,
    /// Commands refused (unknown target or transport unavailable)
    pub commands_dropped: u64,
    /// Listener invocations for accepted changes (replays excluded)
    pub notifications_delivered: u64,
    /// Updates that matched the current value and were filtered
    pub updates_suppressed: u64,
}

impl BridgeStats {
    /// Commands accepted but not yet settled
    pub fn commands_outstanding(&self) -> u64 {
        self.commands_enqueued.saturating_sub(self.commands_completed)
    }
}

/// Live counters shared by the session components
#[derive(Debug, Default)]
pub struct BridgeCounters {
    pub(crate) pulses_sent: AtomicU64,
    pub(crate) numeric_writes: AtomicU64,
    pub(crate) publishes_dropped: AtomicU64,
    pub(crate) commands_enqueued: AtomicU64,
    pub(crate) commands_completed: AtomicU64,
    pub(crate) commands_dropped: AtomicU64,
    pub(crate) notifications_delivered: AtomicU64,
    pub(crate) updates_suppressed: AtomicU64,
}

impl BridgeCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a snapshot of all counters
    pub fn snapshot(&self) -> BridgeStats {
        BridgeStats {
            pulses_sent: self.pulses_sent.load(Ordering::Relaxed),
            numeric_writes: self.numeric_writes.load(Ordering::Relaxed),
            publishes_dropped: self.publishes_dropped.load(Ordering::Relaxed),
            commands_enqueued: self.commands_enqueued.load(Ordering::Relaxed),
            commands_completed: self.commands_completed.load(Ordering::Relaxed),
            commands_dropped: self.commands_dropped.load(Ordering::Relaxed),
            notifications_delivered: self.notifications_delivered.load(Ordering::Relaxed),
            updates_suppressed: self.updates_suppressed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_counters_are_zero() {
        let counters = BridgeCounters::new();
        assert_eq!(counters.snapshot(), BridgeStats::default());
    }

    #[test]
    fn test_snapshot_reads_counters() {
        let counters = BridgeCounters::new();
        counters.pulses_sent.fetch_add(3, Ordering::Relaxed);
        counters.commands_enqueued.fetch_add(5, Ordering::Relaxed);
        counters.commands_completed.fetch_add(2, Ordering::Relaxed);

        let stats = counters.snapshot();
        assert_eq!(stats.pulses_sent, 3);
        assert_eq!(stats.commands_outstanding(), 3);
    }

    #[test]
    fn test_outstanding_saturates() {
        let stats = BridgeStats {
            commands_completed: 4,
            ..Default::default()
        };
        assert_eq!(stats.commands_outstanding(), 0);
    }
}
