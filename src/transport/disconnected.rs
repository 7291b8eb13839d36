//! Transport for panels without a processor runtime

use crate::contract::SignalKind;

use super::{SignalCallback, SignalValue, SubscriptionHandle, Transport};

/// A transport that is never available
///
/// Every subscription yields `None` and every publish is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisconnectedTransport;

impl Transport for DisconnectedTransport {
    fn subscribe(
        &self,
        kind: SignalKind,
        signal: &str,
        _on_change: SignalCallback,
    ) -> Option<SubscriptionHandle> {
        tracing::debug!(kind = %kind, signal = signal, "Subscribe skipped: transport unavailable");
        None
    }

    fn unsubscribe(&self, _handle: &SubscriptionHandle) {}

    fn publish(&self, kind: SignalKind, signal: &str, value: SignalValue) {
        tracing::debug!(
            kind = %kind,
            signal = signal,
            value = %value,
            "Publish dropped: transport unavailable"
        );
    }

    fn is_available(&self) -> bool {
        false
    }
}
