//! Event bus
//!
//! Fans accepted state changes out to any number of listeners per topic.
//! Listeners are called outside every lock, so a listener may call back into
//! the session (read a snapshot, issue a command) without deadlocking.
//!
//! Publishing and delivering are separate steps. `publish_*` appends to one
//! ordered delivery queue (the store does this while it still holds its own
//! lock, so queue order is write order); `flush` drains it. Only the
//! outermost `flush` delivers: a change published from inside a listener is
//! queued behind the one being delivered, so every listener sees changes in
//! the order they were accepted.
//!
//! ```text
//!   StateStore::apply_*()
//!         │ (change detected, store lock held)
//!         ▼
//!   EventBus::publish_*() ──► [ delivery queue ]
//!                                    │ flush()
//!                                    ├──► listener A
//!                                    ├──► listener B
//!                                    └──► listener C
//! ```
//!
//! Replay-on-join lives in the store's `subscribe_*` methods, which register
//! here and then call the new listener with the current snapshot.

pub mod listeners;

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::state::{MasterAudioState, MicSnapshot, VideoRouteMap};
use crate::stats::BridgeCounters;

pub use listeners::{Listener, Subscription};

use listeners::ListenerSet;

/// A subscribable state key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// System running flag
    System,
    /// Master audio state
    Master,
    /// Audio state of one microphone
    Mic(String),
    /// Whole video routing matrix
    VideoRoutes,
}

/// One accepted change bound to the listeners registered when it was published
struct Delivery {
    listeners: usize,
    run: Box<dyn FnOnce() + Send>,
}

impl Delivery {
    fn new<T: Send + 'static>(listeners: Vec<Listener<T>>, value: T) -> Self {
        Self {
            listeners: listeners.len(),
            run: Box::new(move || {
                for listener in &listeners {
                    listener(&value);
                }
            }),
        }
    }
}

#[derive(Default)]
struct DeliveryQueue {
    pending: VecDeque<Delivery>,
    /// Set while some caller is draining `pending`
    delivering: bool,
}

/// Listener registry for all state domains
pub struct EventBus {
    next_id: AtomicU64,
    system: Mutex<ListenerSet<bool>>,
    master: Mutex<ListenerSet<MasterAudioState>>,
    mics: Mutex<HashMap<String, ListenerSet<MicSnapshot>>>,
    routes: Mutex<ListenerSet<VideoRouteMap>>,
    queue: Mutex<DeliveryQueue>,
    counters: Arc<BridgeCounters>,
}

impl EventBus {
    pub fn new(counters: Arc<BridgeCounters>) -> Self {
        Self {
            next_id: AtomicU64::new(1),
            system: Mutex::new(ListenerSet::new()),
            master: Mutex::new(ListenerSet::new()),
            mics: Mutex::new(HashMap::new()),
            routes: Mutex::new(ListenerSet::new()),
            queue: Mutex::new(DeliveryQueue::default()),
            counters,
        }
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn add_system(self: &Arc<Self>, listener: Listener<bool>) -> Subscription {
        let id = self.allocate_id();
        self.system.lock().insert(id, listener);
        Subscription::new(Arc::downgrade(self), Topic::System, id)
    }

    pub(crate) fn add_master(self: &Arc<Self>, listener: Listener<MasterAudioState>) -> Subscription {
        let id = self.allocate_id();
        self.master.lock().insert(id, listener);
        Subscription::new(Arc::downgrade(self), Topic::Master, id)
    }

    pub(crate) fn add_mic(self: &Arc<Self>, mic_id: &str, listener: Listener<MicSnapshot>) -> Subscription {
        let id = self.allocate_id();
        self.mics
            .lock()
            .entry(mic_id.to_string())
            .or_insert_with(ListenerSet::new)
            .insert(id, listener);
        Subscription::new(Arc::downgrade(self), Topic::Mic(mic_id.to_string()), id)
    }

    pub(crate) fn add_routes(self: &Arc<Self>, listener: Listener<VideoRouteMap>) -> Subscription {
        let id = self.allocate_id();
        self.routes.lock().insert(id, listener);
        Subscription::new(Arc::downgrade(self), Topic::VideoRoutes, id)
    }

    pub(crate) fn publish_system(&self, running: bool) {
        let listeners = self.system.lock().snapshot();
        self.enqueue(listeners, running);
    }

    pub(crate) fn publish_master(&self, state: &MasterAudioState) {
        let listeners = self.master.lock().snapshot();
        self.enqueue(listeners, *state);
    }

    pub(crate) fn publish_mic(&self, mic_id: &str, snapshot: &MicSnapshot) {
        let listeners = self
            .mics
            .lock()
            .get(mic_id)
            .map(ListenerSet::snapshot)
            .unwrap_or_default();
        self.enqueue(listeners, *snapshot);
    }

    pub(crate) fn publish_routes(&self, routes: &VideoRouteMap) {
        let listeners = self.routes.lock().snapshot();
        self.enqueue(listeners, routes.clone());
    }

    fn enqueue<T: Send + 'static>(&self, listeners: Vec<Listener<T>>, value: T) {
        if listeners.is_empty() {
            return;
        }
        self.queue.lock().pending.push_back(Delivery::new(listeners, value));
    }

    /// Deliver every queued change in publish order
    ///
    /// Returns immediately when a delivery is already in progress, on this
    /// thread (a listener published) or another; that caller drains what was
    /// queued here.
    pub(crate) fn flush(&self) {
        {
            let mut queue = self.queue.lock();
            if queue.delivering || queue.pending.is_empty() {
                return;
            }
            queue.delivering = true;
        }

        loop {
            let next = {
                let mut queue = self.queue.lock();
                match queue.pending.pop_front() {
                    Some(delivery) => delivery,
                    None => {
                        queue.delivering = false;
                        break;
                    }
                }
            };
            (next.run)();
            self.counters
                .notifications_delivered
                .fetch_add(next.listeners as u64, Ordering::Relaxed);
        }
    }

    /// Remove one registration
    pub(crate) fn remove(&self, topic: &Topic, id: u64) -> bool {
        let removed = match topic {
            Topic::System => self.system.lock().remove(id),
            Topic::Master => self.master.lock().remove(id),
            Topic::VideoRoutes => self.routes.lock().remove(id),
            Topic::Mic(mic_id) => {
                let mut mics = self.mics.lock();
                let removed = mics.get_mut(mic_id).is_some_and(|set| set.remove(id));
                if mics.get(mic_id).is_some_and(ListenerSet::is_empty) {
                    mics.remove(mic_id);
                }
                removed
            }
        };

        tracing::trace!(topic = ?topic, id = id, removed = removed, "Listener removed");
        removed
    }

    /// Number of listeners on a topic
    pub fn listener_count(&self, topic: &Topic) -> usize {
        match topic {
            Topic::System => self.system.lock().len(),
            Topic::Master => self.master.lock().len(),
            Topic::VideoRoutes => self.routes.lock().len(),
            Topic::Mic(mic_id) => self.mics.lock().get(mic_id).map_or(0, ListenerSet::len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MicAudioState;

    fn bus() -> Arc<EventBus> {
        Arc::new(EventBus::new(Arc::new(BridgeCounters::default())))
    }

    #[test]
    fn test_fan_out_to_all_listeners() {
        let bus = bus();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let a = seen.clone();
        let _sub_a = bus.add_system(Arc::new(move |v: &bool| a.lock().push(("a", *v))));
        let b = seen.clone();
        let _sub_b = bus.add_system(Arc::new(move |v: &bool| b.lock().push(("b", *v))));

        bus.publish_system(true);
        assert!(seen.lock().is_empty());
        bus.flush();

        let mut seen = seen.lock().clone();
        seen.sort();
        assert_eq!(seen, vec![("a", true), ("b", true)]);
    }

    #[test]
    fn test_unsubscribe_twice_leaves_others() {
        let bus = bus();
        let mut first = bus.add_master(Arc::new(|_| {}));
        let _second = bus.add_master(Arc::new(|_| {}));

        first.unsubscribe();
        first.unsubscribe();

        assert!(!first.is_active());
        assert_eq!(bus.listener_count(&Topic::Master), 1);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = bus();
        {
            let _sub = bus.add_routes(Arc::new(|_| {}));
            assert_eq!(bus.listener_count(&Topic::VideoRoutes), 1);
        }
        assert_eq!(bus.listener_count(&Topic::VideoRoutes), 0);
    }

    #[test]
    fn test_mic_topics_are_independent() {
        let bus = bus();
        let hits = Arc::new(Mutex::new(0));

        let counter = hits.clone();
        let sub = bus.add_mic("mic-1", Arc::new(move |_| *counter.lock() += 1));
        assert_eq!(sub.topic(), &Topic::Mic("mic-1".into()));

        let snapshot = MicSnapshot {
            audio: MicAudioState::new(45),
            busy: false,
        };
        bus.publish_mic("mic-2", &snapshot);
        bus.flush();
        assert_eq!(*hits.lock(), 0);

        bus.publish_mic("mic-1", &snapshot);
        bus.flush();
        assert_eq!(*hits.lock(), 1);

        drop(sub);
        assert_eq!(bus.listener_count(&Topic::Mic("mic-1".into())), 0);
    }

    #[test]
    fn test_listener_may_reenter_bus() {
        let bus = bus();
        let inner_bus = Arc::downgrade(&bus);
        let _sub = bus.add_system(Arc::new(move |_| {
            if let Some(bus) = inner_bus.upgrade() {
                // Reading listener counts while being notified must not deadlock
                assert_eq!(bus.listener_count(&Topic::System), 1);
            }
        }));

        bus.publish_system(false);
        bus.flush();
    }

    #[test]
    fn test_nested_publish_delivered_after_current_change() {
        let bus = bus();
        let seen = Arc::new(Mutex::new(Vec::new()));

        // First listener reacts to `true` by publishing `false`
        let inner_bus = Arc::downgrade(&bus);
        let a = seen.clone();
        let _sub_a = bus.add_system(Arc::new(move |v: &bool| {
            a.lock().push(("a", *v));
            if *v {
                if let Some(bus) = inner_bus.upgrade() {
                    bus.publish_system(false);
                    bus.flush();
                }
            }
        }));
        let b = seen.clone();
        let _sub_b = bus.add_system(Arc::new(move |v: &bool| b.lock().push(("b", *v))));

        bus.publish_system(true);
        bus.flush();

        assert_eq!(
            *seen.lock(),
            vec![("a", true), ("b", true), ("a", false), ("b", false)]
        );
    }

    #[test]
    fn test_flush_counts_deliveries() {
        let counters = Arc::new(BridgeCounters::default());
        let bus = Arc::new(EventBus::new(counters.clone()));
        let _a = bus.add_master(Arc::new(|_| {}));
        let _b = bus.add_master(Arc::new(|_| {}));

        bus.publish_master(&MasterAudioState::new(45));
        bus.publish_master(&MasterAudioState::new(50));
        assert_eq!(counters.snapshot().notifications_delivered, 0);

        bus.flush();
        assert_eq!(counters.snapshot().notifications_delivered, 4);
        bus.flush();
        assert_eq!(counters.snapshot().notifications_delivered, 4);
    }

    #[test]
    fn test_subscription_outlives_bus() {
        let bus = bus();
        let mut sub = bus.add_system(Arc::new(|_| {}));
        drop(bus);

        sub.unsubscribe();
        assert!(!sub.is_active());
    }
}
