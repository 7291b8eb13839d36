//! Listener registrations and subscription handles

use std::sync::Weak;

use super::{EventBus, Topic};

/// A state-change listener
pub type Listener<T> = std::sync::Arc<dyn Fn(&T) + Send + Sync>;

/// Listeners registered on one topic, in registration order
pub(crate) struct ListenerSet<T> {
    listeners: Vec<(u64, Listener<T>)>,
}

impl<T> ListenerSet<T> {
    pub(crate) fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, id: u64, listener: Listener<T>) {
        self.listeners.push((id, listener));
    }

    /// Remove one registration; returns false if it was already gone
    pub(crate) fn remove(&mut self, id: u64) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Clone the current listeners so they can be called without the lock
    pub(crate) fn snapshot(&self) -> Vec<Listener<T>> {
        self.listeners.iter().map(|(_, l)| l.clone()).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

/// Handle for a listener registration
///
/// Dropping the handle removes the registration. [`unsubscribe`] does the
/// same explicitly and may be called any number of times.
///
/// [`unsubscribe`]: Subscription::unsubscribe
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    bus: Weak<EventBus>,
    topic: Topic,
    id: u64,
    active: bool,
}

impl Subscription {
    pub(crate) fn new(bus: Weak<EventBus>, topic: Topic, id: u64) -> Self {
        Self {
            bus,
            topic,
            id,
            active: true,
        }
    }

    /// Remove this registration
    ///
    /// Idempotent; never affects other listeners.
    pub fn unsubscribe(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;

        if let Some(bus) = self.bus.upgrade() {
            bus.remove(&self.topic, self.id);
        }
    }

    /// Whether the registration is still live
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Topic this registration listens on
    pub fn topic(&self) -> &Topic {
        &self.topic
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}
