//! # Miko Core - Shared session types
//!
//! Common ground between the audio bridge and the behavior scheduler:
//! the expressive `Mode`, the fixed-format `AudioFrame`, the typed
//! `SessionHandle` both halves coordinate through, and the lossy relay
//! channel carrying amplified downlink audio into the scheduler.
//!
//! ```text
//! ┌────────────────┐   relay queue    ┌─────────────────────┐
//! │  Audio Bridge  │ ───────────────→ │ Behavior Scheduler  │
//! │ (miko-bridge)  │                  │   (miko-motion)     │
//! └────────────────┘                  └─────────────────────┘
//!          │            SessionHandle           │
//!          └────────── requested_mode ──────────┘
//!                    (written by the
//!               classification collaborator)
//! ```

pub mod config;
pub mod frame;
pub mod mode;
pub mod relay;
pub mod session;

pub use config::CoreConfig;
pub use frame::{AudioFrame, CHANNELS, FRAME_PERIOD, FRAME_SAMPLES, SAMPLE_RATE};
pub use mode::{Mode, UnknownMode};
pub use relay::{relay_channel, RelayConsumer, RelayProducer, DEFAULT_RELAY_CAPACITY};
pub use session::SessionHandle;
