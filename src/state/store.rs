//! State store implementation
//!
//! The single owner of last-known processor state. Every write goes through
//! change detection: an update that leaves the snapshot structurally equal
//! is counted and dropped without notifying anyone.
//!
//! Accepted changes are queued on the bus while the write lock is held, so
//! notification order always matches write order, and delivered once the
//! lock is released.

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::bus::{EventBus, Listener, Subscription};
use crate::contract::AudioLimits;
use crate::stats::BridgeCounters;

use super::types::{
    MasterAudioState, MasterUpdate, MicAudioState, MicSnapshot, MicUpdate, Origin, VideoRoute,
    VideoRouteMap,
};

#[derive(Debug, Clone, Copy)]
struct Tracked<T> {
    value: T,
    origin: Origin,
}

impl<T> Tracked<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            origin: Origin::Default,
        }
    }
}

struct StoreInner {
    system_running: bool,
    master: Tracked<MasterAudioState>,
    mics: HashMap<String, Tracked<MicSnapshot>>,
    routes: VideoRouteMap,
}

impl StoreInner {
    fn mic_entry(&mut self, mic_id: &str, limits: &AudioLimits) -> &mut Tracked<MicSnapshot> {
        self.mics.entry(mic_id.to_string()).or_insert_with(|| {
            Tracked::new(MicSnapshot {
                audio: MicAudioState::new(limits.initial_volume()),
                busy: false,
            })
        })
    }
}

/// In-memory cache of processor state for one session
pub struct StateStore {
    limits: AudioLimits,
    inner: RwLock<StoreInner>,
    bus: Arc<EventBus>,
    counters: Arc<BridgeCounters>,
}

impl StateStore {
    /// Create a store with every display unrouted and audio at its defaults
    pub fn new<I, S>(limits: AudioLimits, displays: I, counters: Arc<BridgeCounters>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            limits,
            inner: RwLock::new(StoreInner {
                system_running: false,
                master: Tracked::new(MasterAudioState::new(limits.initial_volume())),
                mics: HashMap::new(),
                routes: VideoRouteMap::new(displays),
            }),
            bus: Arc::new(EventBus::new(Arc::clone(&counters))),
            counters,
        }
    }

    /// Audio limits used for defaults
    pub fn limits(&self) -> &AudioLimits {
        &self.limits
    }

    /// Listener registry backing the `subscribe_*` methods
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    fn suppressed(&self) {
        self.counters.updates_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    /// Deliver changes queued by writes that did not deliver on their own
    pub(crate) fn flush_notifications(&self) {
        self.bus.flush();
    }

    // --- system ---------------------------------------------------------

    pub fn system_running(&self) -> bool {
        self.inner.read().system_running
    }

    /// Record processor feedback for the system running flag
    ///
    /// There is no optimistic path: start and stop are pulses whose outcome
    /// only the processor knows.
    pub fn apply_system_inbound(&self, running: bool) -> bool {
        {
            let mut inner = self.inner.write();
            if inner.system_running == running {
                drop(inner);
                self.suppressed();
                return false;
            }
            inner.system_running = running;
            self.bus.publish_system(running);
        }

        tracing::info!(running = running, "System running state changed");
        self.bus.flush();
        true
    }

    /// Listen for system running changes; called once immediately with the current value
    pub fn subscribe_system<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        let listener: Listener<bool> = Arc::new(listener);
        let (subscription, current) = {
            let inner = self.inner.read();
            (self.bus.add_system(listener.clone()), inner.system_running)
        };
        listener(&current);
        subscription
    }

    // --- microphones ----------------------------------------------------

    /// Snapshot of a microphone, created with defaults on first reference
    pub fn mic(&self, mic_id: &str) -> MicSnapshot {
        if let Some(entry) = self.inner.read().mics.get(mic_id) {
            return entry.value;
        }
        self.inner.write().mic_entry(mic_id, &self.limits).value
    }

    /// Who last wrote a microphone's audio state
    pub fn mic_origin(&self, mic_id: &str) -> Origin {
        self.inner
            .read()
            .mics
            .get(mic_id)
            .map_or(Origin::Default, |entry| entry.origin)
    }

    /// Record processor feedback for a microphone
    pub fn apply_mic_inbound(&self, mic_id: &str, update: MicUpdate) -> bool {
        let changed = self.update_mic(mic_id, update, Origin::Confirmed, None);
        self.bus.flush();
        changed
    }

    /// Apply a local change ahead of processor confirmation
    pub fn apply_mic_optimistic(&self, mic_id: &str, update: MicUpdate) -> bool {
        let changed = self.update_mic(mic_id, update, Origin::Optimistic, None);
        self.bus.flush();
        changed
    }

    /// Optimistic update and busy flag in one notification
    ///
    /// Queues the notification without delivering it; the caller flushes
    /// once it has released its own locks.
    pub(crate) fn apply_mic_command(&self, mic_id: &str, update: MicUpdate, busy: bool) -> bool {
        self.update_mic(mic_id, update, Origin::Optimistic, Some(busy))
    }

    /// Queue-only like [`apply_mic_command`](Self::apply_mic_command)
    pub(crate) fn set_mic_busy(&self, mic_id: &str, busy: bool) -> bool {
        self.update_mic(mic_id, MicUpdate::default(), Origin::Optimistic, Some(busy))
    }

    fn update_mic(&self, mic_id: &str, update: MicUpdate, origin: Origin, busy: Option<bool>) -> bool {
        let mut inner = self.inner.write();
        let entry = inner.mic_entry(mic_id, &self.limits);
        let audio = update.apply(&entry.value.audio);
        // Feedback confirms even an unchanged value; local writes only mark what they change
        if !update.is_empty() && (origin == Origin::Confirmed || audio != entry.value.audio) {
            entry.origin = origin;
        }

        let next = MicSnapshot {
            audio,
            busy: busy.unwrap_or(entry.value.busy),
        };
        if next == entry.value {
            drop(inner);
            self.suppressed();
            return false;
        }

        entry.value = next;
        tracing::trace!(
            mic = mic_id,
            volume = next.audio.volume,
            muted = next.audio.muted,
            busy = next.busy,
            origin = ?origin,
            "Microphone state changed"
        );
        self.bus.publish_mic(mic_id, &next);
        true
    }

    /// Listen for changes of one microphone; called once immediately with its snapshot
    pub fn subscribe_mic<F>(&self, mic_id: &str, listener: F) -> Subscription
    where
        F: Fn(&MicSnapshot) + Send + Sync + 'static,
    {
        let listener: Listener<MicSnapshot> = Arc::new(listener);
        let (subscription, current) = {
            let mut inner = self.inner.write();
            let current = inner.mic_entry(mic_id, &self.limits).value;
            (self.bus.add_mic(mic_id, listener.clone()), current)
        };
        listener(&current);
        subscription
    }

    // --- master ---------------------------------------------------------

    pub fn master(&self) -> MasterAudioState {
        self.inner.read().master.value
    }

    pub fn master_origin(&self) -> Origin {
        self.inner.read().master.origin
    }

    /// Record processor feedback for the master audio state
    pub fn apply_master_inbound(&self, update: MasterUpdate) -> bool {
        self.update_master(update, Origin::Confirmed)
    }

    /// Apply a local master change ahead of processor confirmation
    pub fn apply_master_optimistic(&self, update: MasterUpdate) -> bool {
        self.update_master(update, Origin::Optimistic)
    }

    fn update_master(&self, update: MasterUpdate, origin: Origin) -> bool {
        {
            let mut inner = self.inner.write();
            let next = update.apply(&inner.master.value);
            if origin == Origin::Confirmed || next != inner.master.value {
                inner.master.origin = origin;
            }
            if next == inner.master.value {
                drop(inner);
                self.suppressed();
                return false;
            }
            inner.master.value = next;
            self.bus.publish_master(&next);
        }

        self.bus.flush();
        true
    }

    /// Listen for master audio changes; called once immediately with the current state
    pub fn subscribe_master<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&MasterAudioState) + Send + Sync + 'static,
    {
        let listener: Listener<MasterAudioState> = Arc::new(listener);
        let (subscription, current) = {
            let inner = self.inner.read();
            (self.bus.add_master(listener.clone()), inner.master.value)
        };
        listener(&current);
        subscription
    }

    // --- video routes ---------------------------------------------------

    /// Snapshot of the whole routing matrix
    pub fn routes(&self) -> VideoRouteMap {
        self.inner.read().routes.clone()
    }

    /// Route of one display, `None` if the display is not configured
    pub fn route(&self, display_id: &str) -> Option<VideoRoute> {
        self.inner.read().routes.get(display_id).cloned()
    }

    /// Record processor feedback for a display's routed source
    ///
    /// Routes are never written optimistically; only feedback moves a display
    /// between `Unrouted` and `RoutedTo`.
    pub fn apply_route_inbound(&self, display_id: &str, route: VideoRoute) -> bool {
        let next = {
            let mut inner = self.inner.write();
            let changed = inner.routes.set(display_id, route);
            match changed {
                None => {
                    drop(inner);
                    tracing::warn!(display = display_id, "Route feedback for unknown display ignored");
                    return false;
                }
                Some(false) => None,
                Some(true) => {
                    self.bus.publish_routes(&inner.routes);
                    inner.routes.get(display_id).cloned()
                }
            }
        };

        match next {
            Some(route) => {
                tracing::debug!(
                    display = display_id,
                    source = ?route.source_id(),
                    "Video route changed"
                );
                self.bus.flush();
                true
            }
            None => {
                self.suppressed();
                false
            }
        }
    }

    /// Listen for routing changes; called once immediately with the current matrix
    pub fn subscribe_routes<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&VideoRouteMap) + Send + Sync + 'static,
    {
        let listener: Listener<VideoRouteMap> = Arc::new(listener);
        let (subscription, current) = {
            let inner = self.inner.read();
            (self.bus.add_routes(listener.clone()), inner.routes.clone())
        };
        listener(&current);
        subscription
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    fn store() -> StateStore {
        StateStore::new(
            AudioLimits::default(),
            ["display-1", "display-2"],
            Arc::new(BridgeCounters::default()),
        )
    }

    #[test]
    fn test_defaults_on_first_reference() {
        let store = store();
        let snapshot = store.mic("mic-7");

        assert_eq!(snapshot.audio, MicAudioState::new(45));
        assert!(!snapshot.busy);
        assert_eq!(store.mic_origin("mic-7"), Origin::Default);
        assert_eq!(store.master(), MasterAudioState::new(45));
        assert!(!store.system_running());
        assert_eq!(store.route("display-2"), Some(VideoRoute::Unrouted));
    }

    #[test]
    fn test_replay_on_subscribe_matches_snapshot() {
        let store = store();
        store.apply_mic_inbound("mic-1", MicUpdate::volume(70));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = store.subscribe_mic("mic-1", move |s: &MicSnapshot| sink.lock().push(*s));

        assert_eq!(*seen.lock(), vec![store.mic("mic-1")]);
    }

    #[test]
    fn test_duplicate_update_does_not_notify() {
        let store = store();
        let hits = Arc::new(Mutex::new(0));
        let counter = hits.clone();
        let _sub = store.subscribe_master(move |_: &MasterAudioState| *counter.lock() += 1);
        assert_eq!(*hits.lock(), 1); // replay

        assert!(store.apply_master_inbound(MasterUpdate::volume(60)));
        assert!(!store.apply_master_inbound(MasterUpdate::volume(60)));
        assert!(!store.apply_master_optimistic(MasterUpdate::volume(60)));

        assert_eq!(*hits.lock(), 2);
    }

    #[test]
    fn test_system_duplicate_suppressed() {
        let counters = Arc::new(BridgeCounters::default());
        let store = StateStore::new(AudioLimits::default(), ["display-1"], counters.clone());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = store.subscribe_system(move |v: &bool| sink.lock().push(*v));

        store.apply_system_inbound(true);
        store.apply_system_inbound(true);
        store.apply_system_inbound(false);

        assert_eq!(*seen.lock(), vec![false, true, false]);
        assert_eq!(counters.snapshot().updates_suppressed, 1);
        assert_eq!(counters.snapshot().notifications_delivered, 2);
    }

    #[test]
    fn test_inbound_confirms_and_overrides_optimistic() {
        let store = store();

        store.apply_mic_optimistic("mic-1", MicUpdate::volume(50));
        assert_eq!(store.mic_origin("mic-1"), Origin::Optimistic);

        store.apply_mic_inbound("mic-1", MicUpdate::volume(48));
        assert_eq!(store.mic("mic-1").audio.volume, 48);
        assert_eq!(store.mic_origin("mic-1"), Origin::Confirmed);
    }

    #[test]
    fn test_equal_inbound_still_confirms_without_notifying() {
        let store = store();
        store.apply_mic_optimistic("mic-1", MicUpdate::muted(true));

        let hits = Arc::new(Mutex::new(0));
        let counter = hits.clone();
        let _sub = store.subscribe_mic("mic-1", move |_: &MicSnapshot| *counter.lock() += 1);

        assert!(!store.apply_mic_inbound("mic-1", MicUpdate::muted(true)));
        assert_eq!(store.mic_origin("mic-1"), Origin::Confirmed);
        assert_eq!(*hits.lock(), 1);
    }

    #[test]
    fn test_equal_optimistic_keeps_confirmation() {
        let store = store();
        store.apply_master_inbound(MasterUpdate::volume(30));
        store.apply_master_optimistic(MasterUpdate::volume(30));
        assert_eq!(store.master_origin(), Origin::Confirmed);

        store.apply_master_optimistic(MasterUpdate::volume(35));
        assert_eq!(store.master_origin(), Origin::Optimistic);
    }

    #[test]
    fn test_busy_flag_is_a_change() {
        let store = store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = store.subscribe_mic("mic-1", move |s: &MicSnapshot| sink.lock().push(s.busy));

        assert!(store.apply_mic_command("mic-1", MicUpdate::volume(50), true));
        assert!(!store.set_mic_busy("mic-1", true));
        assert!(store.set_mic_busy("mic-1", false));
        assert_eq!(*seen.lock(), vec![false]);
        store.flush_notifications();

        assert_eq!(*seen.lock(), vec![false, true, false]);
        // Busy bookkeeping alone does not change provenance
        assert_eq!(store.mic_origin("mic-1"), Origin::Optimistic);
    }

    #[test]
    fn test_route_feedback() {
        let store = store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = store.subscribe_routes(move |r: &VideoRouteMap| sink.lock().push(r.clone()));

        let routed = VideoRoute::RoutedTo("source-3".into());
        assert!(store.apply_route_inbound("display-1", routed.clone()));
        assert!(!store.apply_route_inbound("display-1", routed.clone()));
        assert!(!store.apply_route_inbound("display-9", routed));

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(
            seen[1].get("display-1").and_then(VideoRoute::source_id),
            Some("source-3")
        );
        // Unknown displays never enter the map
        assert_eq!(store.routes().len(), 2);
    }

    #[test]
    fn test_unsubscribed_listener_not_called() {
        let store = store();
        let hits = Arc::new(Mutex::new(0));
        let counter = hits.clone();
        let mut sub = store.subscribe_system(move |_: &bool| *counter.lock() += 1);

        sub.unsubscribe();
        store.apply_system_inbound(true);

        assert_eq!(*hits.lock(), 1);
    }

    #[test]
    fn test_write_from_listener_is_delivered_in_order() {
        let store = Arc::new(store());
        let seen = Arc::new(Mutex::new(Vec::new()));

        // Reacts to a mute by unmuting, the way a panel view issuing a command would
        let inner = Arc::downgrade(&store);
        let _reacting = store.subscribe_mic("mic-1", move |s: &MicSnapshot| {
            if s.audio.muted {
                if let Some(store) = inner.upgrade() {
                    store.apply_mic_optimistic("mic-1", MicUpdate::muted(false));
                }
            }
        });
        let sink = seen.clone();
        let _watching = store.subscribe_mic("mic-1", move |s: &MicSnapshot| sink.lock().push(s.audio.muted));

        store.apply_mic_inbound("mic-1", MicUpdate::muted(true));

        assert_eq!(*seen.lock(), vec![false, true, false]);
        assert!(!store.mic("mic-1").audio.muted);
    }

    #[test]
    fn test_sessions_are_independent() {
        let a = store();
        let b = store();

        a.apply_system_inbound(true);

        assert!(a.system_running());
        assert!(!b.system_running());
    }
}
