//! touchpanel-bridge: signal mediation between a touch-panel UI and an AV control processor
//!
//! The processor exposes its state and accepts commands over a join bus:
//! numbered boolean, numeric and string slots. This crate sits between the
//! panel's views and that bus:
//!
//! - [`contract`] generates the join assignment from the device inventory
//! - [`transport`] abstracts the bus connection and emits pulses
//! - [`state`] caches last-known processor state with change detection
//! - [`bus`] fans state changes out to listeners, with replay on subscribe
//! - [`sequencer`] serializes microphone commands behind select pulses
//! - [`routing`] maps video sources to and from their wire index
//! - [`session`] wires it all together as a [`ControlSession`]
//!
//! Operations never block. Pulse release, settle delays and the connect
//! watchdog are scheduled tokio tasks, so a session must be driven from
//! inside a tokio runtime.

pub mod bus;
pub mod contract;
pub mod error;
pub mod routing;
pub mod sequencer;
pub mod session;
pub mod state;
pub mod stats;
pub mod transport;

pub use contract::{DeviceInventory, SignalRegistry};
pub use error::{Error, Result};
pub use routing::RoutingResolver;
pub use sequencer::{CommandSequencer, MicCommand};
pub use session::{ConnectionEvent, ConnectionStatus, ControlSession, SessionConfig};
pub use state::StateStore;
pub use transport::{SignalValue, Transport};
