//! Signal registry
//!
//! Maps the panel's logical signals onto numbered joins. The registry is
//! generated once from the device inventory at startup:
//!
//! ```text
//!   DeviceInventory ──► SignalRegistry::generate()
//!                         │
//!                         ├── fixed signals (reserved low joins)
//!                         ├── SelectMic{i}Btn / SelectMic{i}Fb   (boolean, after fixed)
//!                         └── Display{d}SourcePress / SourceFb   (numeric, after fixed)
//! ```
//!
//! Outbound and inbound signals number their joins independently, and each
//! signal kind is its own numbering space within a direction.

pub mod config;
pub mod error;
pub mod export;
pub mod inventory;
pub mod registry;
pub mod signal;

pub use config::ContractConfig;
pub use error::ContractError;
pub use export::ContractDocument;
pub use inventory::{AudioLimits, Device, DeviceInventory};
pub use registry::SignalRegistry;
pub use signal::{Direction, EventSignal, SignalDescriptor, SignalKind, StateSignal};
