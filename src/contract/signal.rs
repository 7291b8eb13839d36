//! Signal descriptors and the fixed join table
//!
//! The processor program and the panel agree on every signal by name and
//! join number. The fixed signals below occupy the low end of each numbering
//! space; per-device signals are appended after them by the registry.

use std::fmt;

/// Wire type of a join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignalKind {
    /// Digital join
    Boolean,
    /// Analog join
    Numeric,
    /// Serial join
    String,
}

impl SignalKind {
    /// All kinds, in contract order
    pub const ALL: [SignalKind; 3] = [SignalKind::Boolean, SignalKind::Numeric, SignalKind::String];

    /// Short lowercase name used in the exported contract
    pub fn as_str(self) -> &'static str {
        match self {
            SignalKind::Boolean => "boolean",
            SignalKind::Numeric => "numeric",
            SignalKind::String => "string",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which way a signal travels
///
/// Outbound signals are events raised by the panel; inbound signals carry
/// processor-authoritative state. The two directions number their joins
/// independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Panel to processor
    Outbound,
    /// Processor to panel
    Inbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Outbound => f.write_str("outbound"),
            Direction::Inbound => f.write_str("inbound"),
        }
    }
}

/// A single named join
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignalDescriptor {
    /// Fully qualified signal name (e.g. "Touchpanel.StartSystemBtn")
    pub name: String,
    /// Wire type
    pub kind: SignalKind,
    /// Join number within the (kind, direction) numbering space
    pub join: u32,
    /// Direction of travel
    pub direction: Direction,
}

/// Fixed outbound signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventSignal {
    StartSystem,
    StopSystem,
    SetMute,
    VolumeUp,
    VolumeDown,
    MasterVolumeUp,
    MasterVolumeDown,
    MasterVolumeMute,
    SelectedMicVolume,
    MasterVolume,
    SelectedMicId,
}

impl EventSignal {
    /// All fixed outbound signals, in registry order
    pub const ALL: [EventSignal; 11] = [
        EventSignal::StartSystem,
        EventSignal::StopSystem,
        EventSignal::SetMute,
        EventSignal::VolumeUp,
        EventSignal::VolumeDown,
        EventSignal::MasterVolumeUp,
        EventSignal::MasterVolumeDown,
        EventSignal::MasterVolumeMute,
        EventSignal::SelectedMicVolume,
        EventSignal::MasterVolume,
        EventSignal::SelectedMicId,
    ];

    /// Unqualified signal name
    pub fn short_name(self) -> &'static str {
        match self {
            EventSignal::StartSystem => "StartSystemBtn",
            EventSignal::StopSystem => "StopSystemBtn",
            EventSignal::SetMute => "SetMuteBtn",
            EventSignal::VolumeUp => "VolumeUpBtn",
            EventSignal::VolumeDown => "VolumeDownBtn",
            EventSignal::MasterVolumeUp => "MasterVolUpBtn",
            EventSignal::MasterVolumeDown => "MasterVolDownBtn",
            EventSignal::MasterVolumeMute => "MasterVolMuteBtn",
            EventSignal::SelectedMicVolume => "SelectedMicVolumeBtn",
            EventSignal::MasterVolume => "MasterVolumeBtn",
            EventSignal::SelectedMicId => "SelectedMicIdBtn",
        }
    }

    pub fn kind(self) -> SignalKind {
        match self {
            EventSignal::SelectedMicVolume | EventSignal::MasterVolume => SignalKind::Numeric,
            EventSignal::SelectedMicId => SignalKind::String,
            _ => SignalKind::Boolean,
        }
    }

    pub fn join(self) -> u32 {
        match self {
            EventSignal::StartSystem => 1,
            EventSignal::StopSystem => 2,
            EventSignal::SetMute => 3,
            EventSignal::VolumeUp => 4,
            EventSignal::VolumeDown => 5,
            EventSignal::MasterVolumeUp => 6,
            EventSignal::MasterVolumeDown => 7,
            EventSignal::MasterVolumeMute => 8,
            EventSignal::SelectedMicVolume => 1,
            EventSignal::MasterVolume => 2,
            EventSignal::SelectedMicId => 1,
        }
    }

    /// Inbound signal carrying the same join on the processor side
    #[cfg(test)]
    fn sibling(self) -> StateSignal {
        match self {
            EventSignal::StartSystem => StateSignal::SystemRunning,
            EventSignal::StopSystem => StateSignal::StopSystem,
            EventSignal::SetMute => StateSignal::SelectedMicMute,
            EventSignal::VolumeUp => StateSignal::VolumeUp,
            EventSignal::VolumeDown => StateSignal::VolumeDown,
            EventSignal::MasterVolumeUp => StateSignal::MasterVolumeUp,
            EventSignal::MasterVolumeDown => StateSignal::MasterVolumeDown,
            EventSignal::MasterVolumeMute => StateSignal::MasterVolumeMute,
            EventSignal::SelectedMicVolume => StateSignal::SelectedMicVolume,
            EventSignal::MasterVolume => StateSignal::MasterVolume,
            EventSignal::SelectedMicId => StateSignal::SelectedMicId,
        }
    }
}

/// Fixed inbound signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateSignal {
    SystemRunning,
    StopSystem,
    SelectedMicMute,
    VolumeUp,
    VolumeDown,
    MasterVolumeUp,
    MasterVolumeDown,
    MasterVolumeMute,
    SelectedMicVolume,
    MasterVolume,
    SelectedMicId,
}

impl StateSignal {
    /// All fixed inbound signals, in registry order
    pub const ALL: [StateSignal; 11] = [
        StateSignal::SystemRunning,
        StateSignal::StopSystem,
        StateSignal::SelectedMicMute,
        StateSignal::VolumeUp,
        StateSignal::VolumeDown,
        StateSignal::MasterVolumeUp,
        StateSignal::MasterVolumeDown,
        StateSignal::MasterVolumeMute,
        StateSignal::SelectedMicVolume,
        StateSignal::MasterVolume,
        StateSignal::SelectedMicId,
    ];

    /// Unqualified signal name
    pub fn short_name(self) -> &'static str {
        match self {
            StateSignal::SystemRunning => "SystemRunningFb",
            StateSignal::StopSystem => "StopSystemFb",
            StateSignal::SelectedMicMute => "SelectedMicMuteFb",
            StateSignal::VolumeUp => "VolumeUpFb",
            StateSignal::VolumeDown => "VolumeDownFb",
            StateSignal::MasterVolumeUp => "MasterVolUpFb",
            StateSignal::MasterVolumeDown => "MasterVolDownFb",
            StateSignal::MasterVolumeMute => "MasterVolMuteFb",
            StateSignal::SelectedMicVolume => "SelectedMicVolumeFb",
            StateSignal::MasterVolume => "MasterVolumeFb",
            StateSignal::SelectedMicId => "SelectedMicIdFb",
        }
    }

    pub fn kind(self) -> SignalKind {
        match self {
            StateSignal::SelectedMicVolume | StateSignal::MasterVolume => SignalKind::Numeric,
            StateSignal::SelectedMicId => SignalKind::String,
            _ => SignalKind::Boolean,
        }
    }

    pub fn join(self) -> u32 {
        match self {
            StateSignal::SystemRunning => 1,
            StateSignal::StopSystem => 2,
            StateSignal::SelectedMicMute => 3,
            StateSignal::VolumeUp => 4,
            StateSignal::VolumeDown => 5,
            StateSignal::MasterVolumeUp => 6,
            StateSignal::MasterVolumeDown => 7,
            StateSignal::MasterVolumeMute => 8,
            StateSignal::SelectedMicVolume => 1,
            StateSignal::MasterVolume => 2,
            StateSignal::SelectedMicId => 1,
        }
    }
}

/// Name of the select event for the 1-based microphone position
pub(crate) fn select_mic_event_name(position: usize) -> String {
    format!("SelectMic{}Btn", position)
}

/// Name of the select feedback for the 1-based microphone position
pub(crate) fn select_mic_state_name(position: usize) -> String {
    format!("SelectMic{}Fb", position)
}

/// Name of the route command for the 1-based display position
pub(crate) fn display_route_event_name(position: usize) -> String {
    format!("Display{}SourcePress", position)
}

/// Name of the routed-source feedback for the 1-based display position
pub(crate) fn display_route_state_name(position: usize) -> String {
    format!("Display{}SourceFb", position)
}
