//! In-memory transport
//!
//! Records every outbound publish with its timestamp and lets the caller
//! play the processor's part by injecting inbound values. Used by the tests
//! and the demos.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::contract::SignalKind;

use super::{SignalCallback, SignalValue, SubscriptionHandle, Transport};

/// A recorded outbound publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireEvent {
    pub kind: SignalKind,
    pub signal: String,
    pub value: SignalValue,
    pub at: Instant,
}

impl WireEvent {
    /// Rising edge of a boolean signal
    pub fn is_press(&self) -> bool {
        self.value == SignalValue::Boolean(true)
    }
}

/// Transport backed by in-process maps
pub struct LoopbackTransport {
    available: AtomicBool,
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<String, Vec<(u64, SignalCallback)>>>,
    published: Mutex<Vec<WireEvent>>,
}

impl LoopbackTransport {
    /// Create an available transport
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            next_id: AtomicU64::new(1),
            subscribers: Mutex::new(HashMap::new()),
            published: Mutex::new(Vec::new()),
        }
    }

    /// Create a transport that starts out unavailable
    pub fn unavailable() -> Self {
        let transport = Self::new();
        transport.set_available(false);
        transport
    }

    /// Toggle availability (simulates connect/disconnect)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    /// Deliver an inbound value to every subscriber of `signal`
    ///
    /// Returns the number of callbacks invoked.
    pub fn inject(&self, signal: &str, value: SignalValue) -> usize {
        let callbacks: Vec<SignalCallback> = self
            .subscribers
            .lock()
            .get(signal)
            .map(|subs| subs.iter().map(|(_, cb)| cb.clone()).collect())
            .unwrap_or_default();

        for callback in &callbacks {
            callback(&value);
        }
        callbacks.len()
    }

    /// All publishes recorded so far
    pub fn published(&self) -> Vec<WireEvent> {
        self.published.lock().clone()
    }

    /// Drain the recorded publishes
    pub fn take_published(&self) -> Vec<WireEvent> {
        std::mem::take(&mut *self.published.lock())
    }

    /// Rising edges only, as signal names, in publish order
    pub fn presses(&self) -> Vec<String> {
        self.published
            .lock()
            .iter()
            .filter(|e| e.is_press())
            .map(|e| e.signal.clone())
            .collect()
    }

    /// Number of live subscriptions on a signal
    pub fn subscriber_count(&self, signal: &str) -> usize {
        self.subscribers.lock().get(signal).map_or(0, Vec::len)
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for LoopbackTransport {
    fn subscribe(
        &self,
        kind: SignalKind,
        signal: &str,
        on_change: SignalCallback,
    ) -> Option<SubscriptionHandle> {
        if !self.is_available() {
            return None;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .entry(signal.to_string())
            .or_default()
            .push((id, on_change));

        Some(SubscriptionHandle {
            kind,
            signal: signal.to_string(),
            id,
        })
    }

    fn unsubscribe(&self, handle: &SubscriptionHandle) {
        let mut subscribers = self.subscribers.lock();
        if let Some(subs) = subscribers.get_mut(&handle.signal) {
            subs.retain(|(id, _)| *id != handle.id);
            if subs.is_empty() {
                subscribers.remove(&handle.signal);
            }
        }
    }

    fn publish(&self, kind: SignalKind, signal: &str, value: SignalValue) {
        if !self.is_available() {
            return;
        }

        self.published.lock().push(WireEvent {
            kind,
            signal: signal.to_string(),
            value,
            at: Instant::now(),
        });
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }
}
