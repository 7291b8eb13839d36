//! Microphone commands

use std::fmt;

use crate::contract::{AudioLimits, EventSignal};
use crate::state::{MicAudioState, MicUpdate};

/// A command addressed to one microphone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicCommand {
    /// Raise or lower the volume; one up/down pulse regardless of magnitude
    VolumeDelta { delta: i32 },
    /// Toggle mute towards the given value
    SetMute(bool),
    /// Make this microphone the processor's selected one
    Select,
}

impl MicCommand {
    /// Local state change applied at enqueue time
    pub fn optimistic_update(&self, current: &MicAudioState, limits: &AudioLimits) -> MicUpdate {
        match *self {
            MicCommand::VolumeDelta { delta } => {
                MicUpdate::volume(limits.clamp(current.volume.saturating_add(delta)))
            }
            MicCommand::SetMute(muted) => MicUpdate::muted(muted),
            MicCommand::Select => MicUpdate::default(),
        }
    }

    /// Pulse emitted after selection, if any
    pub fn wire_event(&self) -> Option<EventSignal> {
        match *self {
            MicCommand::VolumeDelta { delta } if delta > 0 => Some(EventSignal::VolumeUp),
            MicCommand::VolumeDelta { delta } if delta < 0 => Some(EventSignal::VolumeDown),
            MicCommand::VolumeDelta { .. } => None,
            MicCommand::SetMute(_) => Some(EventSignal::SetMute),
            MicCommand::Select => None,
        }
    }

    /// Whether the select pulse is sent even if the target is already selected
    pub fn forces_select(&self) -> bool {
        matches!(self, MicCommand::Select)
    }
}

impl fmt::Display for MicCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MicCommand::VolumeDelta { delta } => write!(f, "volume {:+}", delta),
            MicCommand::SetMute(muted) => write!(f, "mute {}", muted),
            MicCommand::Select => f.write_str("select"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_delta_clamps() {
        let limits = AudioLimits::default();
        let current = MicAudioState::new(98);

        let update = MicCommand::VolumeDelta { delta: 5 }.optimistic_update(&current, &limits);
        assert_eq!(update, MicUpdate::volume(100));

        let current = MicAudioState::new(2);
        let update = MicCommand::VolumeDelta { delta: -5 }.optimistic_update(&current, &limits);
        assert_eq!(update, MicUpdate::volume(0));
    }

    #[test]
    fn test_wire_events() {
        assert_eq!(
            MicCommand::VolumeDelta { delta: 10 }.wire_event(),
            Some(EventSignal::VolumeUp)
        );
        assert_eq!(
            MicCommand::VolumeDelta { delta: -1 }.wire_event(),
            Some(EventSignal::VolumeDown)
        );
        assert_eq!(MicCommand::VolumeDelta { delta: 0 }.wire_event(), None);
        assert_eq!(MicCommand::SetMute(false).wire_event(), Some(EventSignal::SetMute));
        assert_eq!(MicCommand::Select.wire_event(), None);
        assert!(MicCommand::Select.forces_select());
    }

    #[test]
    fn test_select_has_no_local_effect() {
        let update = MicCommand::Select.optimistic_update(&MicAudioState::new(45), &AudioLimits::default());
        assert!(update.is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(MicCommand::VolumeDelta { delta: 5 }.to_string(), "volume +5");
        assert_eq!(MicCommand::VolumeDelta { delta: -5 }.to_string(), "volume -5");
        assert_eq!(MicCommand::SetMute(true).to_string(), "mute true");
    }
}
