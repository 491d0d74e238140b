//! # Miko Bridge - Real-time audio bridge
//!
//! Moves audio bidirectionally between a remote call and the local devices,
//! amplifying and relaying the downlink for the behavior scheduler.
//!
//! ```text
//! ┌──────────────┐  uplink (mic → call)   ┌─────────────────┐
//! │ Local input  │ ─────────────────────→ │                 │
//! │   (cpal)     │                        │  Call transport │
//! └──────────────┘                        │   (external)    │
//! ┌──────────────┐  downlink (call → spk) │                 │
//! │ Local output │ ←───────────────────── └─────────────────┘
//! │   (cpal)     │            │ ×3 gain, saturating
//! └──────────────┘            ↓
//!                       relay queue → behavior scheduler
//! ```
//!
//! Both loops block on a single-fire [`StartGate`] before their first I/O:
//! local routing acknowledged AND remote join completed, with any error on
//! either path opening the gate immediately so failure is observable.

pub mod bridge;
pub mod call;
pub mod device;
pub mod error;
pub mod gate;

pub use bridge::{amplify, amplify_frame, AudioBridge, BridgeConfig};
pub use call::{CallEvent, CallParticipant, CallTransport, LoopbackTransport};
pub use device::{
    open_input, open_output, AudioInput, AudioOutput, DeviceConfig, FrameReader, FrameWriter,
    InputStreamGuard, OutputStreamGuard,
};
pub use error::{BridgeError, BridgeResult};
pub use gate::{GateOutcome, StartGate};
