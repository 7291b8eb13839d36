//! Pulse emission
//!
//! A pulse is a momentary true-then-false on a boolean join. The release is
//! a scheduled one-shot task, so emitting a pulse never blocks the caller.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::contract::{SignalDescriptor, SignalKind};
use crate::stats::BridgeCounters;

use super::{SignalValue, Transport};

/// Default press duration of a pulse
pub const DEFAULT_PULSE_WIDTH: Duration = Duration::from_millis(75);

/// Emits pulses and numeric writes through a transport
#[derive(Clone)]
pub struct Pulser {
    transport: Arc<dyn Transport>,
    width: Duration,
    counters: Arc<BridgeCounters>,
}

impl Pulser {
    pub fn new(transport: Arc<dyn Transport>, width: Duration, counters: Arc<BridgeCounters>) -> Self {
        Self {
            transport,
            width,
            counters,
        }
    }

    /// Get the underlying transport
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Press duration
    pub fn width(&self) -> Duration {
        self.width
    }

    /// Emit a pulse on a boolean signal
    ///
    /// Must be called from within a tokio runtime.
    pub fn pulse(&self, signal: &SignalDescriptor) {
        if signal.kind != SignalKind::Boolean {
            tracing::warn!(signal = %signal.name, kind = %signal.kind, "Pulse on non-boolean signal ignored");
            return;
        }
        if !self.transport.is_available() {
            self.counters.publishes_dropped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(signal = %signal.name, "Pulse dropped: transport unavailable");
            return;
        }

        self.transport
            .publish(SignalKind::Boolean, &signal.name, SignalValue::Boolean(true));
        self.counters.pulses_sent.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(signal = %signal.name, join = signal.join, "Pulse");

        let transport = Arc::clone(&self.transport);
        let name = signal.name.clone();
        let width = self.width;
        tokio::spawn(async move {
            tokio::time::sleep(width).await;
            transport.publish(SignalKind::Boolean, &name, SignalValue::Boolean(false));
        });
    }

    /// Write a value to a numeric signal
    pub fn write(&self, signal: &SignalDescriptor, value: u16) {
        if signal.kind != SignalKind::Numeric {
            tracing::warn!(signal = %signal.name, kind = %signal.kind, "Numeric write on non-numeric signal ignored");
            return;
        }
        if !self.transport.is_available() {
            self.counters.publishes_dropped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(signal = %signal.name, value = value, "Write dropped: transport unavailable");
            return;
        }

        self.transport
            .publish(SignalKind::Numeric, &signal.name, SignalValue::Numeric(value));
        self.counters.numeric_writes.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(signal = %signal.name, join = signal.join, value = value, "Numeric write");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::Direction;
    use crate::transport::LoopbackTransport;

    fn descriptor(name: &str, kind: SignalKind) -> SignalDescriptor {
        SignalDescriptor {
            name: name.into(),
            kind,
            join: 1,
            direction: Direction::Outbound,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pulse_releases_after_width() {
        let transport = Arc::new(LoopbackTransport::new());
        let counters = Arc::new(BridgeCounters::default());
        let pulser = Pulser::new(transport.clone(), DEFAULT_PULSE_WIDTH, counters.clone());

        pulser.pulse(&descriptor("Touchpanel.StartSystemBtn", SignalKind::Boolean));
        assert_eq!(transport.published().len(), 1);

        tokio::time::sleep(Duration::from_millis(100)).await;

        let events = transport.published();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].value, SignalValue::Boolean(true));
        assert_eq!(events[1].value, SignalValue::Boolean(false));
        assert_eq!(events[1].at - events[0].at, DEFAULT_PULSE_WIDTH);
        assert_eq!(counters.snapshot().pulses_sent, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_transport_counts_drops() {
        let transport = Arc::new(LoopbackTransport::unavailable());
        let counters = Arc::new(BridgeCounters::default());
        let pulser = Pulser::new(transport.clone(), DEFAULT_PULSE_WIDTH, counters.clone());

        pulser.pulse(&descriptor("A", SignalKind::Boolean));
        pulser.write(&descriptor("B", SignalKind::Numeric), 3);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(transport.published().is_empty());
        assert_eq!(counters.snapshot().publishes_dropped, 2);
    }

    #[tokio::test]
    async fn test_kind_mismatch_ignored() {
        let transport = Arc::new(LoopbackTransport::new());
        let pulser = Pulser::new(
            transport.clone(),
            DEFAULT_PULSE_WIDTH,
            Arc::new(BridgeCounters::default()),
        );

        pulser.pulse(&descriptor("Numeric", SignalKind::Numeric));
        pulser.write(&descriptor("Digital", SignalKind::Boolean), 1);

        assert!(transport.published().is_empty());
    }
}
