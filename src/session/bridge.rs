//! Control session
//!
//! Owns one instance of every component and exposes the operations the
//! panel's views call. All operations return immediately; none of them fail
//! at runtime. Problems are logged and absorbed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::bus::Subscription;
use crate::contract::{ContractDocument, DeviceInventory, EventSignal, SignalRegistry};
use crate::error::Result;
use crate::routing::RoutingResolver;
use crate::sequencer::{CommandSequencer, MicCommand};
use crate::state::{MasterAudioState, MicSnapshot, StateStore, VideoRoute, VideoRouteMap};
use crate::stats::{BridgeCounters, BridgeStats};
use crate::transport::{Pulser, Transport};

use super::config::SessionConfig;
use super::feedback::FeedbackLinks;
use super::status::{ConnectionEvent, ConnectionMonitor, ConnectionStatus};

/// Mediation layer between a touch panel's views and the room processor
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use touchpanel_bridge::contract::DeviceInventory;
/// use touchpanel_bridge::session::{ControlSession, SessionConfig};
/// use touchpanel_bridge::transport::LoopbackTransport;
///
/// #[tokio::main]
/// async fn main() -> touchpanel_bridge::Result<()> {
///     let inventory = DeviceInventory::from_path("touchpanel.json")?;
///     let transport = Arc::new(LoopbackTransport::new());
///     let session = ControlSession::new(inventory, transport, SessionConfig::default())?;
///
///     let _sub = session.subscribe_mic("mic-1", |state| println!("{:?}", state));
///     session.mic_volume_up("mic-1");
///     Ok(())
/// }
/// ```
pub struct ControlSession {
    config: SessionConfig,
    inventory: DeviceInventory,
    registry: Arc<SignalRegistry>,
    resolver: Arc<RoutingResolver>,
    store: Arc<StateStore>,
    sequencer: CommandSequencer,
    pulser: Pulser,
    feedback: FeedbackLinks,
    monitor: Arc<ConnectionMonitor>,
    counters: Arc<BridgeCounters>,
    closed: AtomicBool,
}

impl ControlSession {
    /// Build a session and attach feedback
    ///
    /// Fails only if the inventory cannot produce a consistent contract.
    pub fn new(
        inventory: DeviceInventory,
        transport: Arc<dyn Transport>,
        config: SessionConfig,
    ) -> Result<Self> {
        let registry = Arc::new(SignalRegistry::with_config(&inventory, config.contract.clone())?);
        let resolver = Arc::new(RoutingResolver::from_inventory(&inventory));
        let counters = Arc::new(BridgeCounters::new());
        let store = Arc::new(StateStore::new(
            inventory.audio,
            registry.displays().to_vec(),
            Arc::clone(&counters),
        ));
        let pulser = Pulser::new(Arc::clone(&transport), config.pulse_width, Arc::clone(&counters));
        let sequencer = CommandSequencer::new(
            pulser.clone(),
            Arc::clone(&registry),
            Arc::clone(&store),
            config.settle_delay,
            Arc::clone(&counters),
        );
        let feedback = FeedbackLinks::new(transport, &registry, &store, &sequencer, &resolver);
        let monitor = Arc::new(ConnectionMonitor::new(config.connection_timeout));

        let session = Self {
            config,
            inventory,
            registry,
            resolver,
            store,
            sequencer,
            pulser,
            feedback,
            monitor,
            counters,
            closed: AtomicBool::new(false),
        };

        let live = session.feedback.attach();
        tracing::info!(
            component = %session.config.contract.component_name,
            microphones = session.inventory.microphones.len(),
            displays = session.inventory.displays.len(),
            sources = session.inventory.sources.len(),
            feedback = live,
            "Control session created"
        );

        Ok(session)
    }

    fn is_closed(&self) -> bool {
        if self.closed.load(Ordering::Acquire) {
            tracing::debug!("Operation on closed session ignored");
            return true;
        }
        false
    }

    // --- system ---------------------------------------------------------

    pub fn start_system(&self) {
        if self.is_closed() {
            return;
        }
        self.pulser.pulse(self.registry.event(EventSignal::StartSystem));
    }

    pub fn stop_system(&self) {
        if self.is_closed() {
            return;
        }
        self.pulser.pulse(self.registry.event(EventSignal::StopSystem));
    }

    pub fn system_running(&self) -> bool {
        self.store.system_running()
    }

    pub fn subscribe_system<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&bool) + Send + Sync + 'static,
    {
        self.store.subscribe_system(listener)
    }

    // --- microphones ----------------------------------------------------

    /// Make a microphone the processor's selected one
    ///
    /// Always emits exactly one select pulse, even if the microphone is
    /// already selected.
    pub fn select_microphone(&self, mic_id: &str) -> bool {
        self.enqueue(mic_id, MicCommand::Select)
    }

    /// Ask the processor to expose a microphone's current state
    ///
    /// The processor only reports the selected microphone, so this selects it;
    /// the feedback that follows lands in the store.
    pub fn request_mic_state(&self, mic_id: &str) -> bool {
        self.enqueue(mic_id, MicCommand::Select)
    }

    /// Raise or lower a microphone's volume
    ///
    /// A zero delta does nothing.
    pub fn adjust_mic_volume(&self, mic_id: &str, delta: i32) -> bool {
        if delta == 0 {
            return false;
        }
        self.enqueue(mic_id, MicCommand::VolumeDelta { delta })
    }

    /// One configured step up
    pub fn mic_volume_up(&self, mic_id: &str) -> bool {
        self.adjust_mic_volume(mic_id, self.inventory.audio.step)
    }

    /// One configured step down
    pub fn mic_volume_down(&self, mic_id: &str) -> bool {
        self.adjust_mic_volume(mic_id, -self.inventory.audio.step)
    }

    /// Drive a microphone's mute towards `muted`
    ///
    /// The wire signal toggles, so nothing is sent when the snapshot already
    /// shows the requested value.
    pub fn set_mic_mute(&self, mic_id: &str, muted: bool) -> bool {
        if self.current_mute(mic_id) == Some(muted) {
            tracing::debug!(mic = mic_id, muted = muted, "Mute already in requested state");
            return false;
        }
        self.enqueue(mic_id, MicCommand::SetMute(muted))
    }

    pub fn toggle_mic_mute(&self, mic_id: &str) -> bool {
        let muted = !self.current_mute(mic_id).unwrap_or(false);
        self.enqueue(mic_id, MicCommand::SetMute(muted))
    }

    fn current_mute(&self, mic_id: &str) -> Option<bool> {
        self.registry
            .has_microphone(mic_id)
            .then(|| self.store.mic(mic_id).audio.muted)
    }

    fn enqueue(&self, mic_id: &str, command: MicCommand) -> bool {
        if self.is_closed() {
            return false;
        }
        self.sequencer.enqueue(mic_id, command)
    }

    pub fn mic(&self, mic_id: &str) -> MicSnapshot {
        self.store.mic(mic_id)
    }

    pub fn subscribe_mic<F>(&self, mic_id: &str, listener: F) -> Subscription
    where
        F: Fn(&MicSnapshot) + Send + Sync + 'static,
    {
        self.store.subscribe_mic(mic_id, listener)
    }

    /// Microphone the processor currently exposes
    pub fn selected_microphone(&self) -> Option<String> {
        self.sequencer.selected()
    }

    // --- master ---------------------------------------------------------

    /// Pulse master volume up or down; the processor reports the result
    pub fn adjust_master_volume(&self, delta: i32) {
        if delta == 0 || self.is_closed() {
            return;
        }
        let event = if delta > 0 {
            EventSignal::MasterVolumeUp
        } else {
            EventSignal::MasterVolumeDown
        };
        self.pulser.pulse(self.registry.event(event));
    }

    pub fn toggle_master_mute(&self) {
        if self.is_closed() {
            return;
        }
        self.pulser.pulse(self.registry.event(EventSignal::MasterVolumeMute));
    }

    pub fn master(&self) -> MasterAudioState {
        self.store.master()
    }

    pub fn subscribe_master<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&MasterAudioState) + Send + Sync + 'static,
    {
        self.store.subscribe_master(listener)
    }

    // --- video routing --------------------------------------------------

    /// Ask the processor to route a source to a display
    ///
    /// The routing matrix only changes when feedback confirms the route.
    /// Unknown ids are logged and ignored.
    pub fn route_source_to_display(&self, source_id: &str, display_id: &str) -> bool {
        if self.is_closed() {
            return false;
        }
        let Some(index) = self.resolver.source_index(source_id) else {
            tracing::warn!(source = source_id, display = display_id, "Route to unknown source ignored");
            return false;
        };
        let Some(signal) = self.registry.display_route_event(display_id) else {
            tracing::warn!(source = source_id, display = display_id, "Route to unknown display ignored");
            return false;
        };

        self.pulser.write(signal, index);
        true
    }

    /// Route a source to every configured display
    ///
    /// Returns the number of route writes issued.
    pub fn route_source_to_all_displays(&self, source_id: &str) -> usize {
        if self.resolver.source_index(source_id).is_none() {
            tracing::warn!(source = source_id, "Route-all to unknown source ignored");
            return 0;
        }

        self.registry
            .displays()
            .iter()
            .filter(|display_id| self.route_source_to_display(source_id, display_id))
            .count()
    }

    pub fn routes(&self) -> VideoRouteMap {
        self.store.routes()
    }

    pub fn route(&self, display_id: &str) -> Option<VideoRoute> {
        self.store.route(display_id)
    }

    pub fn subscribe_video_routes<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&VideoRouteMap) + Send + Sync + 'static,
    {
        self.store.subscribe_routes(listener)
    }

    // --- connection -----------------------------------------------------

    /// Start connecting to a processor and arm the connect watchdog
    pub fn begin_connect(&self, host: &str) -> ConnectionStatus {
        self.monitor.begin(host)
    }

    /// Feed a lifecycle event from the connection collaborator
    ///
    /// A control-channel connect re-attaches any feedback that could not be
    /// subscribed earlier.
    pub fn handle_connection_event(&self, event: ConnectionEvent) -> ConnectionStatus {
        let status = self.monitor.handle(event);
        if event == ConnectionEvent::ControlConnected && !self.closed.load(Ordering::Acquire) {
            self.feedback.attach();
        }
        status
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.monitor.status()
    }

    /// Retry feedback subscriptions that are not live; returns the live count
    pub fn attach_feedback(&self) -> usize {
        if self.is_closed() {
            return 0;
        }
        self.feedback.attach()
    }

    /// Live feedback subscriptions
    pub fn feedback_attached(&self) -> usize {
        self.feedback.live()
    }

    // --- lifecycle ------------------------------------------------------

    /// Detach all feedback; later commands are ignored
    ///
    /// Idempotent. Commands already queued still play out.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.feedback.detach();
        tracing::info!(stats = ?self.stats(), "Control session closed");
    }

    pub fn is_shutdown(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> BridgeStats {
        self.counters.snapshot()
    }

    pub fn registry(&self) -> &SignalRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &RoutingResolver {
        &self.resolver
    }

    pub fn inventory(&self) -> &DeviceInventory {
        &self.inventory
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Processor-side mapping document for this session's contract
    pub fn export_contract(&self) -> ContractDocument {
        ContractDocument::from_registry(&self.registry)
    }
}

impl Drop for ControlSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::*;
    use crate::contract::ContractError;
    use crate::error::Error;
    use crate::state::MicAudioState;
    use crate::transport::{DisconnectedTransport, LoopbackTransport, SignalValue};

    fn inventory() -> DeviceInventory {
        DeviceInventory::new()
            .microphone("mic-1", "Lectern")
            .microphone("mic-2", "Handheld")
            .microphone("mic-3", "Lapel")
            .display("display-1", "Left")
            .display("display-2", "Right")
            .source("source-1", "Laptop")
            .source("source-2", "Document Camera")
            .source("source-3", "Room PC")
            .source("source-4", "Wireless")
    }

    fn session_with(transport: &Arc<LoopbackTransport>) -> ControlSession {
        ControlSession::new(inventory(), transport.clone(), SessionConfig::default()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_volume_command_on_unselected_mic() {
        let transport = Arc::new(LoopbackTransport::new());
        let session = session_with(&transport);
        transport.inject("Touchpanel.SelectedMicIdFb", SignalValue::String("mic-1".into()));

        assert!(session.adjust_mic_volume("mic-2", 5));

        assert_eq!(session.mic("mic-2").audio.volume, 50);
        assert_eq!(
            transport.presses(),
            vec!["Touchpanel.SelectMic2Btn", "Touchpanel.VolumeUpBtn"]
        );

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!session.mic("mic-2").busy);
        assert_eq!(session.stats().commands_outstanding(), 0);
    }

    #[tokio::test]
    async fn test_route_feedback_resolves_source() {
        let transport = Arc::new(LoopbackTransport::new());
        let session = session_with(&transport);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = session.subscribe_video_routes(move |r: &VideoRouteMap| sink.lock().push(r.clone()));

        transport.inject("Touchpanel.Display1SourceFb", SignalValue::Numeric(3));
        transport.inject("Touchpanel.Display1SourceFb", SignalValue::Numeric(3));

        assert_eq!(
            session.route("display-1"),
            Some(VideoRoute::RoutedTo("source-3".into()))
        );
        // Replay plus one change
        assert_eq!(seen.lock().len(), 2);

        transport.inject("Touchpanel.Display1SourceFb", SignalValue::Numeric(0));
        assert_eq!(session.route("display-1"), Some(VideoRoute::Unrouted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_transport_keeps_defaults() {
        let transport = Arc::new(LoopbackTransport::unavailable());
        let session = session_with(&transport);
        assert_eq!(session.feedback_attached(), 0);

        session.start_system();
        session.select_microphone("mic-1");
        session.mic_volume_up("mic-1");
        session.toggle_mic_mute("mic-2");
        session.adjust_master_volume(5);
        session.toggle_master_mute();
        session.route_source_to_display("source-1", "display-1");
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(transport.published().is_empty());
        assert!(!session.system_running());
        assert_eq!(session.mic("mic-1"), session.mic("mic-3"));
        assert_eq!(session.mic("mic-1").audio.volume, 45);
        assert_eq!(session.master(), MasterAudioState::new(45));
        assert!(session
            .routes()
            .iter()
            .all(|(_, route)| *route == VideoRoute::Unrouted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_runtime_transport() {
        let session = ControlSession::new(
            inventory(),
            Arc::new(DisconnectedTransport),
            SessionConfig::default(),
        )
        .unwrap();

        session.mic_volume_up("mic-2");
        session.route_source_to_all_displays("source-1");
        session.handle_connection_event(ConnectionEvent::ControlConnected);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(session.feedback_attached(), 0);
        assert_eq!(session.mic("mic-2").audio.volume, 45);
        let stats = session.stats();
        assert_eq!(stats.commands_dropped, 1);
        assert_eq!(stats.publishes_dropped, 2);
        assert_eq!(stats.pulses_sent + stats.numeric_writes, 0);
    }

    #[tokio::test]
    async fn test_feedback_attaches_on_control_connect() {
        let transport = Arc::new(LoopbackTransport::unavailable());
        let session = session_with(&transport);
        assert_eq!(session.feedback_attached(), 0);

        transport.set_available(true);
        let status = session.handle_connection_event(ConnectionEvent::ControlConnected);

        assert!(status.connected);
        assert_eq!(session.feedback_attached(), 10);
        transport.inject("Touchpanel.SystemRunningFb", SignalValue::Boolean(true));
        assert!(session.system_running());
    }

    #[tokio::test]
    async fn test_shutdown_detaches_once() {
        let transport = Arc::new(LoopbackTransport::new());
        let session = session_with(&transport);
        assert_eq!(transport.subscriber_count("Touchpanel.SystemRunningFb"), 1);

        session.shutdown();
        session.shutdown();

        assert!(session.is_shutdown());
        assert_eq!(session.feedback_attached(), 0);
        assert_eq!(transport.subscriber_count("Touchpanel.SystemRunningFb"), 0);
        assert!(!session.mic_volume_up("mic-1"));
        session.start_system();
        assert!(transport.published().is_empty());
    }

    #[tokio::test]
    async fn test_drop_detaches_feedback() {
        let transport = Arc::new(LoopbackTransport::new());
        {
            let _session = session_with(&transport);
            assert_eq!(transport.subscriber_count("Touchpanel.MasterVolumeFb"), 1);
        }
        assert_eq!(transport.subscriber_count("Touchpanel.MasterVolumeFb"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_selected_mic_feedback_attribution() {
        let transport = Arc::new(LoopbackTransport::new());
        let session = session_with(&transport);

        // No selected microphone yet: ignored
        transport.inject("Touchpanel.SelectedMicVolumeFb", SignalValue::Numeric(80));
        assert_eq!(session.mic("mic-1").audio.volume, 45);

        transport.inject("Touchpanel.SelectedMicIdFb", SignalValue::String("mic-3".into()));
        transport.inject("Touchpanel.SelectedMicVolumeFb", SignalValue::Numeric(80));
        transport.inject("Touchpanel.SelectedMicMuteFb", SignalValue::Boolean(true));

        assert_eq!(session.selected_microphone().as_deref(), Some("mic-3"));
        let mic = session.mic("mic-3");
        assert_eq!(mic.audio.volume, 80);
        assert!(mic.audio.muted);

        // Empty ids leave the selection alone
        transport.inject("Touchpanel.SelectedMicIdFb", SignalValue::String(String::new()));
        assert_eq!(session.selected_microphone().as_deref(), Some("mic-3"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreign_selection_is_not_attributed() {
        let transport = Arc::new(LoopbackTransport::new());
        let session = session_with(&transport);

        transport.inject("Touchpanel.SelectedMicIdFb", SignalValue::String("mic-3".into()));
        transport.inject("Touchpanel.SelectedMicIdFb", SignalValue::String("mic-9".into()));
        assert_eq!(session.selected_microphone(), None);

        // Feedback for a microphone outside the inventory lands nowhere
        transport.inject("Touchpanel.SelectedMicVolumeFb", SignalValue::Numeric(90));
        transport.inject("Touchpanel.SelectedMicMuteFb", SignalValue::Boolean(true));
        assert_eq!(session.mic("mic-3").audio, MicAudioState::new(45));

        // The next command re-selects before acting
        assert!(session.mic_volume_up("mic-3"));
        assert_eq!(
            transport.presses(),
            vec!["Touchpanel.SelectMic3Btn", "Touchpanel.VolumeUpBtn"]
        );
        assert_eq!(session.mic("mic-3").audio.volume, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_from_listener_keeps_delivery_order() {
        let transport = Arc::new(LoopbackTransport::new());
        let session = Arc::new(session_with(&transport));
        transport.inject("Touchpanel.SelectedMicIdFb", SignalValue::String("mic-1".into()));

        // A view that insists the microphone stays live
        let weak = Arc::downgrade(&session);
        let _enforcer = session.subscribe_mic("mic-1", move |s: &MicSnapshot| {
            if s.audio.muted {
                if let Some(session) = weak.upgrade() {
                    session.set_mic_mute("mic-1", false);
                }
            }
        });
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _observer = session.subscribe_mic("mic-1", move |s: &MicSnapshot| sink.lock().push((s.audio.muted, s.busy)));

        transport.inject("Touchpanel.SelectedMicMuteFb", SignalValue::Boolean(true));

        assert_eq!(
            *seen.lock(),
            vec![(false, false), (true, false), (false, true)]
        );
        let current = session.mic("mic-1");
        assert_eq!(seen.lock().last(), Some(&(current.audio.muted, current.busy)));
        assert_eq!(transport.presses(), vec!["Touchpanel.SetMuteBtn"]);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(seen.lock().last(), Some(&(false, false)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_inbound_overrides_optimistic() {
        let transport = Arc::new(LoopbackTransport::new());
        let session = session_with(&transport);

        session.mic_volume_up("mic-1");
        assert_eq!(session.mic("mic-1").audio.volume, 50);

        // Processor clamps differently and reports back
        transport.inject("Touchpanel.SelectedMicIdFb", SignalValue::String("mic-1".into()));
        transport.inject("Touchpanel.SelectedMicVolumeFb", SignalValue::Numeric(47));
        assert_eq!(session.mic("mic-1").audio.volume, 47);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_mute_is_noop_when_already_set() {
        let transport = Arc::new(LoopbackTransport::new());
        let session = session_with(&transport);

        assert!(!session.set_mic_mute("mic-1", false));
        assert!(transport.published().is_empty());

        assert!(session.set_mic_mute("mic-1", true));
        assert!(session.mic("mic-1").audio.muted);
        assert!(session.toggle_mic_mute("mic-1"));
        assert!(!session.mic("mic-1").audio.muted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delta_does_nothing() {
        let transport = Arc::new(LoopbackTransport::new());
        let session = session_with(&transport);

        assert!(!session.adjust_mic_volume("mic-1", 0));
        session.adjust_master_volume(0);

        assert!(transport.published().is_empty());
        assert_eq!(session.stats().commands_enqueued, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_master_commands_are_pulses_only() {
        let transport = Arc::new(LoopbackTransport::new());
        let session = session_with(&transport);

        session.adjust_master_volume(-5);
        session.toggle_master_mute();

        assert_eq!(
            transport.presses(),
            vec!["Touchpanel.MasterVolDownBtn", "Touchpanel.MasterVolMuteBtn"]
        );
        assert_eq!(session.master(), MasterAudioState::new(45));

        transport.inject("Touchpanel.MasterVolumeFb", SignalValue::Numeric(40));
        transport.inject("Touchpanel.MasterVolDownFb", SignalValue::Boolean(true));
        let master = session.master();
        assert_eq!(master.volume, 40);
        assert!(master.vol_down_active);
    }

    #[tokio::test]
    async fn test_route_writes_source_index() {
        let transport = Arc::new(LoopbackTransport::new());
        let session = session_with(&transport);

        assert!(session.route_source_to_display("source-2", "display-2"));
        assert!(!session.route_source_to_display("source-9", "display-2"));
        assert!(!session.route_source_to_display("source-2", "display-9"));

        let events = transport.published();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].signal, "Touchpanel.Display2SourcePress");
        assert_eq!(events[0].value, SignalValue::Numeric(2));
        // Not committed until feedback arrives
        assert_eq!(session.route("display-2"), Some(VideoRoute::Unrouted));
    }

    #[tokio::test]
    async fn test_route_all_displays() {
        let transport = Arc::new(LoopbackTransport::new());
        let session = session_with(&transport);

        assert_eq!(session.route_source_to_all_displays("source-4"), 2);
        assert_eq!(session.route_source_to_all_displays("nope"), 0);

        let signals: Vec<String> = transport.published().into_iter().map(|e| e.signal).collect();
        assert_eq!(
            signals,
            vec!["Touchpanel.Display1SourcePress", "Touchpanel.Display2SourcePress"]
        );
        assert_eq!(session.stats().numeric_writes, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_system_pulses_and_feedback() {
        let transport = Arc::new(LoopbackTransport::new());
        let session = session_with(&transport);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _sub = session.subscribe_system(move |v: &bool| sink.lock().push(*v));

        session.start_system();
        assert_eq!(transport.presses(), vec!["Touchpanel.StartSystemBtn"]);
        // No optimistic change
        assert!(!session.system_running());

        transport.inject("Touchpanel.SystemRunningFb", SignalValue::Boolean(true));
        assert_eq!(*seen.lock(), vec![false, true]);
    }

    #[test]
    fn test_bad_inventory_is_fatal() {
        let inventory = DeviceInventory::new()
            .microphone("mic-1", "A")
            .microphone("mic-1", "B");
        let result = ControlSession::new(
            inventory,
            Arc::new(LoopbackTransport::new()),
            SessionConfig::default(),
        );

        assert!(matches!(
            result,
            Err(Error::Contract(ContractError::DuplicateDevice { .. }))
        ));
    }

    #[test]
    fn test_export_contract_matches_registry() {
        let transport = Arc::new(LoopbackTransport::new());
        let session = session_with(&transport);
        let doc = session.export_contract();

        assert_eq!(doc.name, "CrestronTouchpanel");
    }
}
