//! # Miko Motion - Mode-driven behavior scheduler
//!
//! A fixed-rate 50 Hz control loop that reconciles the externally requested
//! mode against the active mode with hysteresis, drives per-mode actuator
//! output through a publish-only bus, and republishes relayed call audio on
//! the robot's audio-out channel.
//!
//! ```text
//!  SessionHandle          ┌────────────────────┐       ┌───────────────┐
//!  requested_mode ──────→ │ BehaviorScheduler  │ ────→ │   RobotBus    │
//!                         │  ModeArbiter (3s   │       │ joints · LEDs │
//!  relay queue ─────────→ │  hold, hysteresis) │       │ tone · audio  │
//!  (bridge downlink)      │  StepBank          │       └───────────────┘
//!                         └────────────────────┘
//! ```
//!
//! Happy and sad are held for a minimum dwell so emotional beats read as
//! complete gestures; idle, speaking and listening are reactive and switch
//! on the next tick.

pub mod arbiter;
pub mod bus;
pub mod error;
pub mod mic;
pub mod scheduler;
pub mod steps;

pub use arbiter::{ModeArbiter, ModeChange};
pub use bus::{
    CosmeticPose, IllumWord, JointPose, NullBus, RobotBus, ToneCommand, VelocityCommand,
};
pub use error::{MotionError, MotionResult};
pub use mic::{AlsaMic, MicControl, NullMic};
pub use scheduler::{BehaviorScheduler, SchedulerConfig};
pub use steps::{HappyStep, IdleStep, PoseState, SadStep, SpeakingStep, StepBank};
