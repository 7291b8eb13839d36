//! Control session
//!
//! Wires the components together for one panel:
//!
//! ```text
//!            ┌────────────────────── ControlSession ──────────────────────┐
//!  views ──► │ commands ──► CommandSequencer ──► Pulser ──► Transport ──► │ ──► processor
//!            │                   │ optimistic                             │
//!            │                   ▼                                        │
//!  views ◄── │ listeners ◄── StateStore ◄── FeedbackLinks ◄── Transport ◄─│ ◄── processor
//!            └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Connection lifecycle events only drive the status banner and re-attach
//! feedback when the control channel comes up.

pub mod bridge;
pub mod config;
mod feedback;
pub mod status;

pub use bridge::ControlSession;
pub use config::SessionConfig;
pub use status::{ConnectionEvent, ConnectionStatus};
