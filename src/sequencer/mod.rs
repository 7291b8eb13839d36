//! Command sequencer
//!
//! The processor exposes the detailed state of one microphone at a time, so
//! every microphone command is preceded by a select pulse unless that
//! microphone is already the selected one. Each microphone has its own FIFO
//! queue; a command stays in flight for the settle delay before the next one
//! for the same microphone is emitted.
//!
//! ```text
//!   enqueue(mic-2, +5)
//!      │ optimistic update, busy = true
//!      ▼
//!   ┌─────────────┐  idle?   ┌──────────────────────────────┐
//!   │ mic-2 queue │ ───────► │ select pulse (if not current)│
//!   └─────────────┘          │ command pulse                │
//!          ▲                 └──────────────┬───────────────┘
//!          │      settle delay elapsed      │
//!          └────────────────────────────────┘
//!                  (queue empty: busy = false)
//! ```
//!
//! There is no retry and no acknowledgement. A dropped pulse still lets the
//! queue advance; inbound feedback reconciles the store afterwards.

pub mod command;
mod queue;

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::contract::SignalRegistry;
use crate::state::StateStore;
use crate::stats::BridgeCounters;
use crate::transport::Pulser;

pub use command::MicCommand;

use queue::TargetQueue;

/// Default wait after a command before the next one for the same target
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(120);

struct Inner {
    pulser: Pulser,
    registry: Arc<SignalRegistry>,
    store: Arc<StateStore>,
    settle_delay: Duration,
    counters: Arc<BridgeCounters>,
    queues: Mutex<HashMap<String, TargetQueue>>,
    /// Sole owner of the processor's currently selected microphone
    selected: Mutex<Option<String>>,
}

/// Per-microphone command queues sharing one selection slot
#[derive(Clone)]
pub struct CommandSequencer {
    inner: Arc<Inner>,
}

impl CommandSequencer {
    pub fn new(
        pulser: Pulser,
        registry: Arc<SignalRegistry>,
        store: Arc<StateStore>,
        settle_delay: Duration,
        counters: Arc<BridgeCounters>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                pulser,
                registry,
                store,
                settle_delay,
                counters,
                queues: Mutex::new(HashMap::new()),
                selected: Mutex::new(None),
            }),
        }
    }

    /// Queue a command for a microphone
    ///
    /// Returns immediately. The optimistic update is applied before this
    /// returns; the wire pulses follow as soon as the target is idle. Returns
    /// false if the command was dropped (unknown microphone or transport
    /// unavailable), in which case the store is left untouched.
    ///
    /// Must be called from within a tokio runtime.
    pub fn enqueue(&self, mic_id: &str, command: MicCommand) -> bool {
        let inner = &self.inner;

        if !inner.registry.has_microphone(mic_id) {
            inner.counters.commands_dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(mic = mic_id, command = %command, "Command for unknown microphone dropped");
            return false;
        }
        if !inner.pulser.transport().is_available() {
            inner.counters.commands_dropped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(mic = mic_id, command = %command, "Command dropped: transport unavailable");
            return false;
        }

        // Queue bookkeeping and the store write happen under the queues lock so
        // a settle completion on another thread cannot clear busy in between
        let (pending, next) = {
            let mut queues = inner.queues.lock();
            let current = inner.store.mic(mic_id);
            let update = command.optimistic_update(&current.audio, inner.store.limits());
            let queue = queues.entry(mic_id.to_string()).or_default();
            queue.push(command);
            let pending = queue.pending();
            let next = queue.start();
            inner.store.apply_mic_command(mic_id, update, true);
            (pending, next)
        };
        inner.counters.commands_enqueued.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(mic = mic_id, command = %command, pending = pending, "Command queued");

        inner.store.flush_notifications();
        if let Some(command) = next {
            self.dispatch(mic_id, command);
        }
        true
    }

    /// Emit the wire actions of a command and schedule its completion
    fn dispatch(&self, mic_id: &str, command: MicCommand) {
        let inner = &self.inner;

        // Held across both pulses: another target's select must not land
        // between this select and its command
        let select = {
            let mut selected = inner.selected.lock();
            let needed = command.forces_select() || selected.as_deref() != Some(mic_id);
            if needed {
                *selected = Some(mic_id.to_string());
                match inner.registry.select_mic_event(mic_id) {
                    Some(signal) => inner.pulser.pulse(signal),
                    None => tracing::warn!(mic = mic_id, "No select signal for microphone"),
                }
            }
            if let Some(event) = command.wire_event() {
                inner.pulser.pulse(inner.registry.event(event));
            }
            needed
        };

        tracing::trace!(mic = mic_id, command = %command, selected = select, "Command dispatched");

        let sequencer = self.clone();
        let mic_id = mic_id.to_string();
        let settle_delay = inner.settle_delay;
        tokio::spawn(async move {
            tokio::time::sleep(settle_delay).await;
            sequencer.complete(&mic_id);
        });
    }

    fn complete(&self, mic_id: &str) {
        let inner = &self.inner;

        // Busy is cleared under the queues lock; an enqueue racing this
        // completion either lands before (and is dispatched here) or after
        // (and sets busy again)
        let next = {
            let mut queues = inner.queues.lock();
            let next = queues.get_mut(mic_id).and_then(TargetQueue::complete);
            if queues.get(mic_id).map_or(true, TargetQueue::is_idle) {
                queues.remove(mic_id);
                inner.store.set_mic_busy(mic_id, false);
                tracing::trace!(mic = mic_id, "Queue idle");
            }
            next
        };

        inner.store.flush_notifications();
        inner.counters.commands_completed.fetch_add(1, Ordering::Relaxed);
        if let Some(command) = next {
            self.dispatch(mic_id, command);
        }
    }

    /// Record the processor's selected microphone from feedback
    ///
    /// Empty ids are ignored. An id outside the inventory clears the
    /// selection: the processor exposes a microphone this session does not
    /// know, so selected-microphone feedback is dropped until a known one is
    /// selected and the next command for any microphone pulses its select.
    pub fn observe_selected(&self, mic_id: &str) {
        let mic_id = mic_id.trim();
        if mic_id.is_empty() {
            return;
        }

        let mut selected = self.inner.selected.lock();
        if !self.inner.registry.has_microphone(mic_id) {
            tracing::warn!(mic = mic_id, "Processor selected an unknown microphone");
            *selected = None;
            return;
        }
        if selected.as_deref() != Some(mic_id) {
            tracing::debug!(mic = mic_id, "Selected microphone changed");
            *selected = Some(mic_id.to_string());
        }
    }

    /// Microphone the processor currently exposes, if known
    pub fn selected(&self) -> Option<String> {
        self.inner.selected.lock().clone()
    }

    /// Whether a command for this microphone is in flight
    pub fn is_in_flight(&self, mic_id: &str) -> bool {
        self.inner
            .queues
            .lock()
            .get(mic_id)
            .is_some_and(TargetQueue::in_flight)
    }

    /// Commands waiting behind the in-flight one
    pub fn pending(&self, mic_id: &str) -> usize {
        self.inner
            .queues
            .lock()
            .get(mic_id)
            .map_or(0, TargetQueue::pending)
    }

    pub fn settle_delay(&self) -> Duration {
        self.inner.settle_delay
    }
}
