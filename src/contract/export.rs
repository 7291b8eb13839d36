//! Contract mapping export
//!
//! Renders a registry as the mapping document the processor-side tooling
//! imports. Maps are ordered so the output is stable across regenerations.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::Result;

use super::registry::SignalRegistry;
use super::signal::{SignalDescriptor, SignalKind};

/// Join binding for an outbound signal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventJoin {
    pub join_id: u32,
    pub smart_object_id: u32,
}

/// One map per signal kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KindSections<T> {
    pub boolean: T,
    pub numeric: T,
    pub string: T,
}

impl<T> KindSections<T> {
    fn section_mut(&mut self, kind: SignalKind) -> &mut T {
        match kind {
            SignalKind::Boolean => &mut self.boolean,
            SignalKind::Numeric => &mut self.numeric,
            SignalKind::String => &mut self.string,
        }
    }
}

/// smart object id -> join -> signal name
pub type StateSection = BTreeMap<u32, BTreeMap<u32, String>>;

/// signal name -> join binding
pub type EventSection = BTreeMap<String, EventJoin>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignalSections {
    pub states: KindSections<StateSection>,
    pub events: KindSections<EventSection>,
}

/// Exported contract mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractDocument {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    pub version: String,
    pub schema_version: u32,
    pub extra_value: String,
    pub signals: SignalSections,
}

impl ContractDocument {
    /// Build the mapping for a registry
    pub fn from_registry(registry: &SignalRegistry) -> Self {
        let config = registry.config();
        let object_id = config.smart_object_id;
        let mut signals = SignalSections::default();

        for signal in registry.inbound() {
            insert_state(&mut signals.states, object_id, signal);
        }
        for signal in registry.outbound() {
            signals.events.section_mut(signal.kind).insert(
                signal.name.clone(),
                EventJoin {
                    join_id: signal.join,
                    smart_object_id: object_id,
                },
            );
        }

        Self {
            name: config.contract_name.clone(),
            timestamp: None,
            version: config.version.clone(),
            schema_version: 1,
            extra_value: "Generated from the panel device inventory".into(),
            signals,
        }
    }

    /// Stamp the document with a generation time
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn insert_state(
    states: &mut KindSections<StateSection>,
    object_id: u32,
    signal: &SignalDescriptor,
) {
    states
        .section_mut(signal.kind)
        .entry(object_id)
        .or_default()
        .insert(signal.join, signal.name.clone());
}
