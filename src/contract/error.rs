//! Contract error types
//!
//! Errors raised while generating the signal registry from a device
//! inventory. All of them are fatal: an inconsistent contract would leave the
//! panel and the processor program out of sync.

use super::signal::{Direction, SignalKind};

/// Error type for registry generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// A device was declared with an empty id
    EmptyDeviceId {
        /// Device class ("microphone", "display", "source")
        class: &'static str,
        /// Position in the inventory list (0-based)
        index: usize,
    },
    /// The same id was declared twice within one device class
    DuplicateDevice {
        class: &'static str,
        id: String,
    },
    /// A generated signal name is already taken in its direction
    NameCollision {
        name: String,
        direction: Direction,
    },
    /// A join number is already taken within its (kind, direction) space
    JoinCollision {
        name: String,
        kind: SignalKind,
        direction: Direction,
        join: u32,
    },
    /// A signal has no sibling of the same kind in the other direction
    MissingSignal {
        name: String,
        kind: SignalKind,
        direction: Direction,
    },
    /// Audio limits are unusable (min above max or zero step)
    InvalidAudioLimits {
        min: i32,
        max: i32,
        step: i32,
    },
}

impl std::fmt::Display for ContractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContractError::EmptyDeviceId { class, index } => {
                write!(f, "Empty {} id at position {}", class, index)
            }
            ContractError::DuplicateDevice { class, id } => {
                write!(f, "Duplicate {} id: {}", class, id)
            }
            ContractError::NameCollision { name, direction } => {
                write!(f, "Signal name collision ({}): {}", direction, name)
            }
            ContractError::JoinCollision {
                name,
                kind,
                direction,
                join,
            } => write!(
                f,
                "Join collision ({} {} join {}): {}",
                direction, kind, join, name
            ),
            ContractError::MissingSignal {
                name,
                kind,
                direction,
            } => write!(
                f,
                "Missing {} sibling for {} signal: {}",
                kind, direction, name
            ),
            ContractError::InvalidAudioLimits { min, max, step } => write!(
                f,
                "Invalid audio limits: min={} max={} step={}",
                min, max, step
            ),
        }
    }
}

impl std::error::Error for ContractError {}
