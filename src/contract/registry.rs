//! Signal registry implementation
//!
//! Assigns a join number to every command and feedback signal for a given
//! device inventory. The fixed signals keep their reserved joins; generated
//! per-device signals follow them in inventory order, so the same inventory
//! always produces the same table.

use std::collections::{HashMap, HashSet};

use super::config::ContractConfig;
use super::error::ContractError;
use super::inventory::DeviceInventory;
use super::signal::{
    display_route_event_name, display_route_state_name, select_mic_event_name,
    select_mic_state_name, Direction, EventSignal, SignalDescriptor, SignalKind, StateSignal,
};

/// Signals for one direction, with collision tracking
#[derive(Debug)]
struct SignalTable {
    direction: Direction,
    signals: Vec<SignalDescriptor>,
    names: HashSet<String>,
    joins: HashSet<(SignalKind, u32)>,
    next_join: [u32; 3],
}

fn kind_slot(kind: SignalKind) -> usize {
    match kind {
        SignalKind::Boolean => 0,
        SignalKind::Numeric => 1,
        SignalKind::String => 2,
    }
}

impl SignalTable {
    fn new(direction: Direction) -> Self {
        Self {
            direction,
            signals: Vec::new(),
            names: HashSet::new(),
            joins: HashSet::new(),
            next_join: [1; 3],
        }
    }

    /// Insert a signal at an explicit join
    fn insert(&mut self, name: String, kind: SignalKind, join: u32) -> Result<usize, ContractError> {
        if self.names.contains(&name) {
            return Err(ContractError::NameCollision {
                name,
                direction: self.direction,
            });
        }
        if !self.joins.insert((kind, join)) {
            return Err(ContractError::JoinCollision {
                name,
                kind,
                direction: self.direction,
                join,
            });
        }

        let slot = kind_slot(kind);
        self.next_join[slot] = self.next_join[slot].max(join + 1);
        self.names.insert(name.clone());
        self.signals.push(SignalDescriptor {
            name,
            kind,
            join,
            direction: self.direction,
        });
        Ok(self.signals.len() - 1)
    }

    /// Insert a signal at the next free join after everything of its kind
    fn append(&mut self, name: String, kind: SignalKind) -> Result<usize, ContractError> {
        let join = self.next_join[kind_slot(kind)];
        self.insert(name, kind, join)
    }

    fn pairs(&self) -> HashSet<(SignalKind, u32)> {
        self.joins.clone()
    }
}

/// Complete join assignment for one panel component
#[derive(Debug, Clone)]
pub struct SignalRegistry {
    config: ContractConfig,
    outbound: Vec<SignalDescriptor>,
    inbound: Vec<SignalDescriptor>,
    select_mic_events: HashMap<String, usize>,
    select_mic_states: HashMap<String, usize>,
    route_events: HashMap<String, usize>,
    route_states: HashMap<String, usize>,
    microphones: Vec<String>,
    displays: Vec<String>,
}

impl SignalRegistry {
    /// Generate the registry with the default contract naming
    pub fn generate(inventory: &DeviceInventory) -> Result<Self, ContractError> {
        Self::with_config(inventory, ContractConfig::default())
    }

    /// Generate the registry with custom contract naming
    ///
    /// Fails if the inventory is inconsistent or if any generated signal
    /// collides with a reserved one. Nothing is dropped silently.
    pub fn with_config(
        inventory: &DeviceInventory,
        config: ContractConfig,
    ) -> Result<Self, ContractError> {
        inventory.validate()?;

        let mut outbound = SignalTable::new(Direction::Outbound);
        let mut inbound = SignalTable::new(Direction::Inbound);

        // Fixed signals first, in enum order, so `event()`/`state()` can index directly
        for event in EventSignal::ALL {
            outbound.insert(config.qualify(event.short_name()), event.kind(), event.join())?;
        }
        for state in StateSignal::ALL {
            inbound.insert(config.qualify(state.short_name()), state.kind(), state.join())?;
        }

        let mut select_mic_events = HashMap::with_capacity(inventory.microphones.len());
        let mut select_mic_states = HashMap::with_capacity(inventory.microphones.len());
        for (index, mic) in inventory.microphones.iter().enumerate() {
            let position = index + 1;
            let event = outbound.append(
                config.qualify(&select_mic_event_name(position)),
                SignalKind::Boolean,
            )?;
            let state = inbound.append(
                config.qualify(&select_mic_state_name(position)),
                SignalKind::Boolean,
            )?;
            select_mic_events.insert(mic.id.clone(), event);
            select_mic_states.insert(mic.id.clone(), state);
        }

        let mut route_events = HashMap::with_capacity(inventory.displays.len());
        let mut route_states = HashMap::with_capacity(inventory.displays.len());
        for (index, display) in inventory.displays.iter().enumerate() {
            let position = index + 1;
            let event = outbound.append(
                config.qualify(&display_route_event_name(position)),
                SignalKind::Numeric,
            )?;
            let state = inbound.append(
                config.qualify(&display_route_state_name(position)),
                SignalKind::Numeric,
            )?;
            route_events.insert(display.id.clone(), event);
            route_states.insert(display.id.clone(), state);
        }

        verify_siblings(&outbound, &inbound)?;
        verify_siblings(&inbound, &outbound)?;

        tracing::info!(
            component = %config.component_name,
            microphones = inventory.microphones.len(),
            displays = inventory.displays.len(),
            sources = inventory.sources.len(),
            outbound = outbound.signals.len(),
            inbound = inbound.signals.len(),
            "Signal registry generated"
        );

        Ok(Self {
            config,
            outbound: outbound.signals,
            inbound: inbound.signals,
            select_mic_events,
            select_mic_states,
            route_events,
            route_states,
            microphones: inventory.microphones.iter().map(|m| m.id.clone()).collect(),
            displays: inventory.displays.iter().map(|d| d.id.clone()).collect(),
        })
    }

    /// Get the contract configuration
    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    /// Fixed outbound signal
    pub fn event(&self, signal: EventSignal) -> &SignalDescriptor {
        &self.outbound[signal as usize]
    }

    /// Fixed inbound signal
    pub fn state(&self, signal: StateSignal) -> &SignalDescriptor {
        &self.inbound[signal as usize]
    }

    /// Select pulse for a microphone
    pub fn select_mic_event(&self, mic_id: &str) -> Option<&SignalDescriptor> {
        self.select_mic_events.get(mic_id).map(|&i| &self.outbound[i])
    }

    /// Select feedback for a microphone
    pub fn select_mic_state(&self, mic_id: &str) -> Option<&SignalDescriptor> {
        self.select_mic_states.get(mic_id).map(|&i| &self.inbound[i])
    }

    /// Route command for a display
    pub fn display_route_event(&self, display_id: &str) -> Option<&SignalDescriptor> {
        self.route_events.get(display_id).map(|&i| &self.outbound[i])
    }

    /// Routed-source feedback for a display
    pub fn display_route_state(&self, display_id: &str) -> Option<&SignalDescriptor> {
        self.route_states.get(display_id).map(|&i| &self.inbound[i])
    }

    /// All outbound signals in assignment order
    pub fn outbound(&self) -> &[SignalDescriptor] {
        &self.outbound
    }

    /// All inbound signals in assignment order
    pub fn inbound(&self) -> &[SignalDescriptor] {
        &self.inbound
    }

    /// Look up a signal by qualified name
    pub fn find(&self, direction: Direction, name: &str) -> Option<&SignalDescriptor> {
        let table = match direction {
            Direction::Outbound => &self.outbound,
            Direction::Inbound => &self.inbound,
        };
        table.iter().find(|s| s.name == name)
    }

    /// Microphone ids in inventory order
    pub fn microphones(&self) -> &[String] {
        &self.microphones
    }

    /// Display ids in inventory order
    pub fn displays(&self) -> &[String] {
        &self.displays
    }

    /// Check whether a microphone is part of the contract
    pub fn has_microphone(&self, mic_id: &str) -> bool {
        self.select_mic_events.contains_key(mic_id)
    }
}

/// Every signal in `table` must have a sibling with the same kind and join in `other`
fn verify_siblings(table: &SignalTable, other: &SignalTable) -> Result<(), ContractError> {
    let available = other.pairs();
    for signal in &table.signals {
        if !available.contains(&(signal.kind, signal.join)) {
            return Err(ContractError::MissingSignal {
                name: signal.name.clone(),
                kind: signal.kind,
                direction: signal.direction,
            });
        }
    }
    Ok(())
}
