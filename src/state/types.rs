//! State domain types
//!
//! Snapshots are plain values compared structurally; an update that produces
//! an equal snapshot is not a change.

use std::fmt;

/// Audio state of one microphone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MicAudioState {
    pub volume: i32,
    pub muted: bool,
}

impl MicAudioState {
    pub fn new(volume: i32) -> Self {
        Self {
            volume,
            muted: false,
        }
    }
}

/// What microphone listeners receive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MicSnapshot {
    pub audio: MicAudioState,
    /// A command for this microphone is queued or in flight
    pub busy: bool,
}

/// Partial update of a microphone's audio state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MicUpdate {
    pub volume: Option<i32>,
    pub muted: Option<bool>,
}

impl MicUpdate {
    /// Update only the volume
    pub fn volume(volume: i32) -> Self {
        Self {
            volume: Some(volume),
            muted: None,
        }
    }

    /// Update only the mute flag
    pub fn muted(muted: bool) -> Self {
        Self {
            volume: None,
            muted: Some(muted),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.volume.is_none() && self.muted.is_none()
    }

    /// Result of applying this update to `current`
    pub fn apply(&self, current: &MicAudioState) -> MicAudioState {
        MicAudioState {
            volume: self.volume.unwrap_or(current.volume),
            muted: self.muted.unwrap_or(current.muted),
        }
    }
}

/// Master audio state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterAudioState {
    pub volume: i32,
    pub muted: bool,
    /// Processor reports the master volume-up ramp as active
    pub vol_up_active: bool,
    /// Processor reports the master volume-down ramp as active
    pub vol_down_active: bool,
}

impl MasterAudioState {
    pub fn new(volume: i32) -> Self {
        Self {
            volume,
            muted: false,
            vol_up_active: false,
            vol_down_active: false,
        }
    }
}

/// Partial update of the master audio state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MasterUpdate {
    pub volume: Option<i32>,
    pub muted: Option<bool>,
    pub vol_up_active: Option<bool>,
    pub vol_down_active: Option<bool>,
}

impl MasterUpdate {
    pub fn volume(volume: i32) -> Self {
        Self {
            volume: Some(volume),
            ..Default::default()
        }
    }

    pub fn muted(muted: bool) -> Self {
        Self {
            muted: Some(muted),
            ..Default::default()
        }
    }

    pub fn vol_up_active(active: bool) -> Self {
        Self {
            vol_up_active: Some(active),
            ..Default::default()
        }
    }

    pub fn vol_down_active(active: bool) -> Self {
        Self {
            vol_down_active: Some(active),
            ..Default::default()
        }
    }

    pub fn apply(&self, current: &MasterAudioState) -> MasterAudioState {
        MasterAudioState {
            volume: self.volume.unwrap_or(current.volume),
            muted: self.muted.unwrap_or(current.muted),
            vol_up_active: self.vol_up_active.unwrap_or(current.vol_up_active),
            vol_down_active: self.vol_down_active.unwrap_or(current.vol_down_active),
        }
    }
}

/// Who last wrote a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Never written; still the configured default
    Default,
    /// Written locally ahead of processor confirmation
    Optimistic,
    /// Written from processor feedback
    Confirmed,
}

/// Routed source of a single display
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VideoRoute {
    Unrouted,
    RoutedTo(String),
}

impl VideoRoute {
    /// Routed source id, if any
    pub fn source_id(&self) -> Option<&str> {
        match self {
            VideoRoute::Unrouted => None,
            VideoRoute::RoutedTo(id) => Some(id),
        }
    }
}

impl fmt::Display for VideoRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoRoute::Unrouted => f.write_str("none"),
            VideoRoute::RoutedTo(id) => f.write_str(id),
        }
    }
}

/// Routed source for every configured display
///
/// The set of displays is fixed at construction; entries can change but
/// never appear or disappear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRouteMap {
    entries: Vec<(String, VideoRoute)>,
}

impl VideoRouteMap {
    /// Create a map with every display unrouted
    pub fn new<I, S>(displays: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: displays
                .into_iter()
                .map(|d| (d.into(), VideoRoute::Unrouted))
                .collect(),
        }
    }

    /// Route of a display, `None` if the display is not configured
    pub fn get(&self, display_id: &str) -> Option<&VideoRoute> {
        self.entries
            .iter()
            .find(|(id, _)| id == display_id)
            .map(|(_, route)| route)
    }

    /// Set the route of a configured display
    ///
    /// Returns `None` for an unknown display, otherwise whether the value changed.
    pub fn set(&mut self, display_id: &str, route: VideoRoute) -> Option<bool> {
        let slot = self
            .entries
            .iter_mut()
            .find(|(id, _)| id == display_id)
            .map(|(_, r)| r)?;
        if *slot == route {
            return Some(false);
        }
        *slot = route;
        Some(true)
    }

    /// Iterate displays in configuration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VideoRoute)> {
        self.entries.iter().map(|(id, route)| (id.as_str(), route))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mic_update_is_partial() {
        let current = MicAudioState {
            volume: 40,
            muted: true,
        };

        assert_eq!(
            MicUpdate::volume(55).apply(&current),
            MicAudioState {
                volume: 55,
                muted: true
            }
        );
        assert_eq!(MicUpdate::default().apply(&current), current);
        assert!(MicUpdate::default().is_empty());
    }

    #[test]
    fn test_master_update_is_partial() {
        let current = MasterAudioState::new(45);
        let next = MasterUpdate::vol_up_active(true).apply(&current);

        assert!(next.vol_up_active);
        assert_eq!(next.volume, 45);
        assert!(!next.vol_down_active);
    }

    #[test]
    fn test_route_map_starts_unrouted() {
        let map = VideoRouteMap::new(["display-1", "display-2"]);

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("display-1"), Some(&VideoRoute::Unrouted));
        assert_eq!(map.get("display-3"), None);
    }

    #[test]
    fn test_route_map_set() {
        let mut map = VideoRouteMap::new(["display-1"]);
        let route = VideoRoute::RoutedTo("source-3".into());

        assert_eq!(map.set("display-1", route.clone()), Some(true));
        assert_eq!(map.set("display-1", route), Some(false));
        assert_eq!(map.set("display-9", VideoRoute::Unrouted), None);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("display-1").unwrap().source_id(), Some("source-3"));
    }

    #[test]
    fn test_route_display() {
        assert_eq!(VideoRoute::Unrouted.to_string(), "none");
        assert_eq!(VideoRoute::RoutedTo("source-1".into()).to_string(), "source-1");
    }
}
