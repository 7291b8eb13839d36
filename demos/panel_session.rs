//! Panel session against a simulated processor
//!
//! Run with: cargo run --example panel_session [INVENTORY_JSON]
//!
//! Examples:
//!   cargo run --example panel_session                           # uses demos/touchpanel.json
//!   RUST_LOG=touchpanel_bridge=trace cargo run --example panel_session
//!
//! The simulated processor polls the loopback transport, reacts to pulses
//! and numeric writes the way a processor program would, and answers with
//! feedback. Every state change the session accepts is printed.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use touchpanel_bridge::contract::DeviceInventory;
use touchpanel_bridge::session::{ConnectionEvent, ControlSession, SessionConfig};
use touchpanel_bridge::state::{MasterAudioState, MicSnapshot, VideoRouteMap};
use touchpanel_bridge::transport::{LoopbackTransport, SignalValue};

/// Minimal processor program: one selected mic, master audio, route matrix
struct SimulatedProcessor {
    transport: Arc<LoopbackTransport>,
    prefix: String,
    microphones: Vec<String>,
    mic_levels: HashMap<String, (u16, bool)>,
    selected: Option<String>,
    master: (u16, bool),
}

impl SimulatedProcessor {
    fn new(transport: Arc<LoopbackTransport>, inventory: &DeviceInventory, component: &str) -> Self {
        let default_volume = inventory.audio.initial_volume() as u16;
        Self {
            transport,
            prefix: format!("{}.", component),
            microphones: inventory.microphones.iter().map(|m| m.id.clone()).collect(),
            mic_levels: inventory
                .microphones
                .iter()
                .map(|m| (m.id.clone(), (default_volume, false)))
                .collect(),
            selected: None,
            master: (default_volume, false),
        }
    }

    fn feedback(&self, name: &str, value: SignalValue) {
        self.transport.inject(&format!("{}{}", self.prefix, name), value);
    }

    fn report_selected(&self) {
        let Some(mic) = &self.selected else { return };
        let (volume, muted) = self.mic_levels[mic];
        self.feedback("SelectedMicIdFb", SignalValue::String(mic.clone()));
        self.feedback("SelectedMicVolumeFb", SignalValue::Numeric(volume));
        self.feedback("SelectedMicMuteFb", SignalValue::Boolean(muted));
    }

    /// Handle everything the panel published since the last poll
    fn poll(&mut self) {
        for event in self.transport.take_published() {
            let Some(name) = event.signal.strip_prefix(&self.prefix) else {
                continue;
            };

            if let SignalValue::Numeric(index) = event.value {
                if let Some(display) = name
                    .strip_prefix("Display")
                    .and_then(|rest| rest.strip_suffix("SourcePress"))
                {
                    self.feedback(
                        &format!("Display{}SourceFb", display),
                        SignalValue::Numeric(index),
                    );
                }
                continue;
            }
            if !event.is_press() {
                continue;
            }

            match name {
                "StartSystemBtn" => self.feedback("SystemRunningFb", SignalValue::Boolean(true)),
                "StopSystemBtn" => self.feedback("SystemRunningFb", SignalValue::Boolean(false)),
                "VolumeUpBtn" | "VolumeDownBtn" | "SetMuteBtn" => {
                    if let Some(mic) = self.selected.clone() {
                        let level = self.mic_levels.entry(mic).or_insert((45, false));
                        match name {
                            "VolumeUpBtn" => level.0 = (level.0 + 5).min(100),
                            "VolumeDownBtn" => level.0 = level.0.saturating_sub(5),
                            _ => level.1 = !level.1,
                        }
                        self.report_selected();
                    }
                }
                "MasterVolUpBtn" => {
                    self.master.0 = (self.master.0 + 5).min(100);
                    self.feedback("MasterVolumeFb", SignalValue::Numeric(self.master.0));
                }
                "MasterVolDownBtn" => {
                    self.master.0 = self.master.0.saturating_sub(5);
                    self.feedback("MasterVolumeFb", SignalValue::Numeric(self.master.0));
                }
                "MasterVolMuteBtn" => {
                    self.master.1 = !self.master.1;
                    self.feedback("MasterVolMuteFb", SignalValue::Boolean(self.master.1));
                }
                other => {
                    let position = other
                        .strip_prefix("SelectMic")
                        .and_then(|rest| rest.strip_suffix("Btn"))
                        .and_then(|n| n.parse::<usize>().ok());
                    if let Some(mic) = position.and_then(|p| self.microphones.get(p - 1)) {
                        self.selected = Some(mic.clone());
                        self.report_selected();
                    }
                }
            }
        }
    }
}

fn print_usage() {
    eprintln!("Usage: panel_session [INVENTORY_JSON]");
    eprintln!();
    eprintln!("Defaults to demos/touchpanel.json");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/touchpanel.json".to_string());

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("touchpanel_bridge=info".parse()?)
                .add_directive("panel_session=info".parse()?),
        )
        .init();

    let inventory = match DeviceInventory::from_path(&path) {
        Ok(inventory) => inventory,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    let transport = Arc::new(LoopbackTransport::new());
    let config = SessionConfig::default();
    let component = config.contract.component_name.clone();
    let session = ControlSession::new(inventory.clone(), transport.clone(), config)?;

    let mut processor = SimulatedProcessor::new(transport.clone(), &inventory, &component);
    let processor_task = tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_millis(10));
        loop {
            tick.tick().await;
            processor.poll();
        }
    });

    session.begin_connect("127.0.0.1");
    session.handle_connection_event(ConnectionEvent::WebSocketConnected);
    let status = session.handle_connection_event(ConnectionEvent::ControlConnected);
    println!("Connection: {:?}", status);

    let _system = session.subscribe_system(|running: &bool| println!("system running: {}", running));
    let _master = session.subscribe_master(|m: &MasterAudioState| {
        println!("master: volume={} muted={}", m.volume, m.muted)
    });
    let _routes = session.subscribe_video_routes(|routes: &VideoRouteMap| {
        let line: Vec<String> = routes.iter().map(|(d, r)| format!("{}={}", d, r)).collect();
        println!("routes: {}", line.join(" "));
    });
    let mic_subs: Vec<_> = inventory
        .microphones
        .iter()
        .map(|mic| {
            let id = mic.id.clone();
            session.subscribe_mic(&mic.id, move |s: &MicSnapshot| {
                println!(
                    "{}: volume={} muted={} busy={}",
                    id, s.audio.volume, s.audio.muted, s.busy
                )
            })
        })
        .collect();

    session.start_system();
    tokio::time::sleep(Duration::from_millis(100)).await;

    if let Some(first) = inventory.microphones.first() {
        session.mic_volume_up(&first.id);
        session.mic_volume_up(&first.id);
        session.toggle_mic_mute(&first.id);
    }
    if let Some(second) = inventory.microphones.get(1) {
        session.mic_volume_down(&second.id);
    }
    session.adjust_master_volume(5);
    tokio::time::sleep(Duration::from_millis(500)).await;

    if let Some(source) = inventory.sources.first() {
        session.route_source_to_all_displays(&source.id);
    }
    if let (Some(source), Some(display)) = (inventory.sources.last(), inventory.displays.first()) {
        session.route_source_to_display(&source.id, &display.id);
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    session.stop_system();
    tokio::time::sleep(Duration::from_millis(100)).await;

    drop(mic_subs);
    session.shutdown();
    processor_task.abort();

    println!();
    println!("Stats: {:?}", session.stats());
    Ok(())
}
