//! Inbound feedback wiring
//!
//! One transport subscription per feedback signal the session consumes.
//! Subscriptions that could not be made (transport unavailable) are kept as
//! empty slots and retried on the next `attach`.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::contract::{SignalKind, SignalRegistry, StateSignal};
use crate::routing::RoutingResolver;
use crate::sequencer::CommandSequencer;
use crate::state::{MasterUpdate, MicUpdate, StateStore};
use crate::transport::{SignalCallback, SignalValue, SubscriptionHandle, Transport};

struct Link {
    kind: SignalKind,
    signal: String,
    callback: SignalCallback,
    handle: Option<SubscriptionHandle>,
}

/// Feedback subscriptions for one session
pub(crate) struct FeedbackLinks {
    transport: Arc<dyn Transport>,
    links: Mutex<Vec<Link>>,
}

impl FeedbackLinks {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        registry: &SignalRegistry,
        store: &Arc<StateStore>,
        sequencer: &CommandSequencer,
        resolver: &Arc<RoutingResolver>,
    ) -> Self {
        let mut links = Vec::new();
        let mut link = |signal: StateSignal, callback: SignalCallback| {
            let descriptor = registry.state(signal);
            links.push(Link {
                kind: descriptor.kind,
                signal: descriptor.name.clone(),
                callback,
                handle: None,
            });
        };

        let s = Arc::clone(store);
        link(
            StateSignal::SystemRunning,
            Arc::new(move |v: &SignalValue| {
                s.apply_system_inbound(v.as_bool());
            }),
        );

        let seq = sequencer.clone();
        link(
            StateSignal::SelectedMicId,
            Arc::new(move |v: &SignalValue| {
                if let Some(mic_id) = v.as_str() {
                    seq.observe_selected(mic_id);
                }
            }),
        );

        let (s, seq) = (Arc::clone(store), sequencer.clone());
        link(
            StateSignal::SelectedMicVolume,
            Arc::new(move |v: &SignalValue| {
                let (Some(mic_id), Some(volume)) = (seq.selected(), v.as_numeric()) else {
                    tracing::debug!(value = %v, "Microphone volume feedback with no selected microphone");
                    return;
                };
                s.apply_mic_inbound(&mic_id, MicUpdate::volume(i32::from(volume)));
            }),
        );

        let (s, seq) = (Arc::clone(store), sequencer.clone());
        link(
            StateSignal::SelectedMicMute,
            Arc::new(move |v: &SignalValue| match seq.selected() {
                Some(mic_id) => {
                    s.apply_mic_inbound(&mic_id, MicUpdate::muted(v.as_bool()));
                }
                None => {
                    tracing::debug!(value = %v, "Microphone mute feedback with no selected microphone");
                }
            }),
        );

        let s = Arc::clone(store);
        link(
            StateSignal::MasterVolume,
            Arc::new(move |v: &SignalValue| {
                if let Some(volume) = v.as_numeric() {
                    s.apply_master_inbound(MasterUpdate::volume(i32::from(volume)));
                }
            }),
        );

        let s = Arc::clone(store);
        link(
            StateSignal::MasterVolumeMute,
            Arc::new(move |v: &SignalValue| {
                s.apply_master_inbound(MasterUpdate::muted(v.as_bool()));
            }),
        );

        let s = Arc::clone(store);
        link(
            StateSignal::MasterVolumeUp,
            Arc::new(move |v: &SignalValue| {
                s.apply_master_inbound(MasterUpdate::vol_up_active(v.as_bool()));
            }),
        );

        let s = Arc::clone(store);
        link(
            StateSignal::MasterVolumeDown,
            Arc::new(move |v: &SignalValue| {
                s.apply_master_inbound(MasterUpdate::vol_down_active(v.as_bool()));
            }),
        );

        for display_id in registry.displays() {
            let Some(descriptor) = registry.display_route_state(display_id) else {
                continue;
            };
            let (s, r, display) = (Arc::clone(store), Arc::clone(resolver), display_id.clone());
            links.push(Link {
                kind: descriptor.kind,
                signal: descriptor.name.clone(),
                callback: Arc::new(move |v: &SignalValue| {
                    let raw = v.as_numeric().unwrap_or(0);
                    s.apply_route_inbound(&display, r.resolve_inbound(raw));
                }),
                handle: None,
            });
        }

        Self {
            transport,
            links: Mutex::new(links),
        }
    }

    /// Subscribe every signal that has no live subscription
    ///
    /// Returns the number of live subscriptions afterwards.
    pub(crate) fn attach(&self) -> usize {
        let mut links = self.links.lock();
        let mut attached = 0;
        for link in links.iter_mut().filter(|l| l.handle.is_none()) {
            link.handle = self
                .transport
                .subscribe(link.kind, &link.signal, Arc::clone(&link.callback));
            if link.handle.is_some() {
                attached += 1;
            }
        }

        let live = links.iter().filter(|l| l.handle.is_some()).count();
        if attached > 0 {
            tracing::info!(attached = attached, live = live, total = links.len(), "Feedback attached");
        } else if live < links.len() {
            tracing::debug!(live = live, total = links.len(), "Feedback not attached: transport unavailable");
        }
        live
    }

    /// Remove every live subscription; empty slots are skipped
    pub(crate) fn detach(&self) {
        let mut links = self.links.lock();
        for link in links.iter_mut() {
            if let Some(handle) = link.handle.take() {
                self.transport.unsubscribe(&handle);
            }
        }
    }

    pub(crate) fn live(&self) -> usize {
        self.links
            .lock()
            .iter()
            .filter(|l| l.handle.is_some())
            .count()
    }
}
