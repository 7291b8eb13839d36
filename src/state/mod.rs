//! State store
//!
//! Last-known processor state for one session: system running flag, master
//! audio, per-microphone audio and the video routing matrix. Reads never
//! touch the transport.
//!
//! ```text
//!   transport feedback ──► apply_*_inbound ─┐
//!                                           ├─► change? ──► EventBus ──► listeners
//!   sequencer intent ───► apply_*_optimistic┘      │
//!                                                  └─ no ──► suppressed
//! ```

pub mod store;
pub mod types;

pub use store::StateStore;
pub use types::{
    MasterAudioState, MasterUpdate, MicAudioState, MicSnapshot, MicUpdate, Origin, VideoRoute,
    VideoRouteMap,
};
