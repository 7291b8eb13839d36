//! Transport adapter
//!
//! The mediation layer talks to the processor only through the [`Transport`]
//! trait: subscribe to a signal, unsubscribe, publish a value. The real
//! implementation wraps the vendor panel runtime; this crate ships a
//! [`DisconnectedTransport`] for panels with no runtime and a
//! [`LoopbackTransport`] that records wire traffic in memory.
//!
//! When the transport is unavailable, `subscribe` returns `None` and
//! `publish` does nothing. Callers never see an error.

pub mod disconnected;
pub mod loopback;
pub mod pulse;

use std::fmt;
use std::sync::Arc;

use crate::contract::SignalKind;

pub use disconnected::DisconnectedTransport;
pub use loopback::{LoopbackTransport, WireEvent};
pub use pulse::Pulser;

/// A value carried on a join
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalValue {
    Boolean(bool),
    /// Analog joins are 16-bit unsigned on the wire
    Numeric(u16),
    String(String),
}

impl SignalValue {
    /// Kind of join this value belongs on
    pub fn kind(&self) -> SignalKind {
        match self {
            SignalValue::Boolean(_) => SignalKind::Boolean,
            SignalValue::Numeric(_) => SignalKind::Numeric,
            SignalValue::String(_) => SignalKind::String,
        }
    }

    /// Truthiness of the value, as the processor program treats it
    pub fn as_bool(&self) -> bool {
        match self {
            SignalValue::Boolean(b) => *b,
            SignalValue::Numeric(n) => *n != 0,
            SignalValue::String(s) => !s.is_empty(),
        }
    }

    /// Numeric reading of the value, if it has one
    pub fn as_numeric(&self) -> Option<u16> {
        match self {
            SignalValue::Boolean(b) => Some(u16::from(*b)),
            SignalValue::Numeric(n) => Some(*n),
            SignalValue::String(s) => s.trim().parse().ok(),
        }
    }

    /// String payload, if this is a serial value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SignalValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Boolean(b) => write!(f, "{}", b),
            SignalValue::Numeric(n) => write!(f, "{}", n),
            SignalValue::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// Callback invoked with every inbound value for a subscribed signal
pub type SignalCallback = Arc<dyn Fn(&SignalValue) + Send + Sync>;

/// Handle for an active transport subscription
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    pub kind: SignalKind,
    pub signal: String,
    pub id: u64,
}

/// Connection to the processor's signal bus
pub trait Transport: Send + Sync {
    /// Subscribe to changes of an inbound signal
    ///
    /// Returns `None` when the transport is unavailable.
    fn subscribe(
        &self,
        kind: SignalKind,
        signal: &str,
        on_change: SignalCallback,
    ) -> Option<SubscriptionHandle>;

    /// Remove a subscription
    fn unsubscribe(&self, handle: &SubscriptionHandle);

    /// Publish a value on an outbound signal
    ///
    /// Dropped silently when the transport is unavailable. Must not invoke
    /// subscription callbacks before returning: the sequencer publishes while
    /// holding its selection lock, and inbound feedback takes that lock.
    fn publish(&self, kind: SignalKind, signal: &str, value: SignalValue);

    /// Whether publishes currently reach the processor
    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_coercions() {
        assert!(SignalValue::Numeric(3).as_bool());
        assert!(!SignalValue::Numeric(0).as_bool());
        assert!(!SignalValue::String(String::new()).as_bool());
        assert_eq!(SignalValue::Boolean(true).as_numeric(), Some(1));
        assert_eq!(SignalValue::String(" 42 ".into()).as_numeric(), Some(42));
        assert_eq!(SignalValue::String("mic".into()).as_numeric(), None);
        assert_eq!(SignalValue::String("mic-1".into()).as_str(), Some("mic-1"));
        assert_eq!(SignalValue::Numeric(1).as_str(), None);
    }

    #[test]
    fn test_value_kind() {
        assert_eq!(SignalValue::Boolean(false).kind(), SignalKind::Boolean);
        assert_eq!(SignalValue::Numeric(0).kind(), SignalKind::Numeric);
        assert_eq!(SignalValue::String("x".into()).kind(), SignalKind::String);
    }
}
