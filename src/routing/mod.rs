//! Routing resolver
//!
//! On the wire a display's source is a 1-based index into the configured
//! source list; `0` (or any index past the end) means nothing is routed.
//! The resolver owns that mapping in both directions.

use std::collections::HashMap;

use crate::contract::DeviceInventory;
use crate::state::VideoRoute;

/// Source id <-> wire index mapping, built once per inventory
#[derive(Debug, Clone, Default)]
pub struct RoutingResolver {
    sources: Vec<String>,
    index_by_id: HashMap<String, u16>,
}

impl RoutingResolver {
    /// Build from source ids in declaration order
    pub fn new<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sources: Vec<String> = sources.into_iter().map(Into::into).collect();
        let mut index_by_id = HashMap::with_capacity(sources.len());
        for (i, id) in sources.iter().enumerate() {
            let Ok(index) = u16::try_from(i + 1) else {
                tracing::warn!(source = %id, "Source beyond wire index range ignored");
                break;
            };
            // First declaration wins; inventory validation rejects duplicates anyway
            index_by_id.entry(id.clone()).or_insert(index);
        }

        Self {
            sources,
            index_by_id,
        }
    }

    pub fn from_inventory(inventory: &DeviceInventory) -> Self {
        Self::new(inventory.sources.iter().map(|s| s.id.as_str()))
    }

    /// Wire index of a source
    pub fn source_index(&self, source_id: &str) -> Option<u16> {
        self.index_by_id.get(source_id).copied()
    }

    /// Source id at a wire index
    pub fn source_for_index(&self, index: u16) -> Option<&str> {
        let slot = usize::from(index).checked_sub(1)?;
        self.sources.get(slot).map(String::as_str)
    }

    /// Interpret a raw routed-source feedback value
    pub fn resolve_inbound(&self, raw: u16) -> VideoRoute {
        match self.source_for_index(raw) {
            Some(id) => VideoRoute::RoutedTo(id.to_string()),
            None => VideoRoute::Unrouted,
        }
    }

    /// Source ids in declaration order
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
