//! The robot's command channels: publish-only, fixed message shapes.
//!
//! The underlying pub/sub middleware is an external collaborator; this trait
//! is the whole surface the scheduler needs. No acknowledgment is expected
//! on any channel.

use crate::error::MotionResult;
use miko_core::{AudioFrame, Mode};
use tracing::trace;

/// Lift angle of the neutral head pose, degrees.
pub const NEUTRAL_LIFT_DEG: f32 = 34.0;

/// Kinematic joint command: tilt, lift, yaw, pitch in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointPose {
    pub tilt: f32,
    pub lift: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl JointPose {
    /// Head up at the resting lift angle, everything else centered.
    pub fn neutral() -> Self {
        Self {
            tilt: 0.0,
            lift: NEUTRAL_LIFT_DEG.to_radians(),
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

/// Cosmetic joint command, six channels in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CosmeticPose {
    pub droop: f32,
    pub wag: f32,
    pub eyelid_left: f32,
    pub eyelid_right: f32,
    pub ear_left: f32,
    pub ear_right: f32,
}

impl CosmeticPose {
    /// Eyes open, ears and tail centered.
    pub fn neutral() -> Self {
        Self {
            droop: 0.0,
            wag: 0.5,
            eyelid_left: 0.0,
            eyelid_right: 0.0,
            ear_left: 0.5,
            ear_right: 0.5,
        }
    }
}

/// One illumination word, replicated across all six LED segments:
/// brightness in the top byte, then R, G, B.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IllumWord(u32);

impl IllumWord {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self((0x3F << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    /// The session palette: one color per mode.
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Idle => Self::rgb(128, 0, 128),
            Mode::Happy => Self::rgb(255, 255, 0),
            Mode::Sad => Self::rgb(0, 0, 255),
            Mode::Speaking => Self::rgb(255, 165, 0),
            Mode::Listening => Self::rgb(0, 255, 0),
        }
    }

    pub fn word(self) -> u32 {
        self.0
    }
}

/// Tone command triple: frequency (Hz), duration, volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneCommand {
    pub frequency: u16,
    pub duration: u16,
    pub volume: u8,
}

impl ToneCommand {
    /// The one-shot chirp played on entering happy.
    pub fn happy_chirp() -> Self {
        Self {
            frequency: 440,
            duration: 120,
            volume: 2,
        }
    }
}

/// Body velocity command in normalized linear/angular units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VelocityCommand {
    pub linear_x: f32,
    pub angular_z: f32,
}

impl VelocityCommand {
    pub fn stop() -> Self {
        Self::default()
    }
}

/// Publish-only view of the robot's actuator, illumination, tone, velocity
/// and audio-out channels.
pub trait RobotBus: Send + Sync {
    fn publish_joints(&self, pose: &JointPose) -> MotionResult<()>;
    fn publish_cosmetics(&self, pose: &CosmeticPose) -> MotionResult<()>;
    fn publish_illum(&self, illum: IllumWord) -> MotionResult<()>;
    fn publish_tone(&self, tone: ToneCommand) -> MotionResult<()>;
    fn publish_velocity(&self, velocity: &VelocityCommand) -> MotionResult<()>;
    fn publish_audio(&self, frame: &AudioFrame) -> MotionResult<()>;
}

/// Bus that traces and discards every command. Stands in when no middleware
/// binding is configured on the host.
#[derive(Debug, Default)]
pub struct NullBus;

impl RobotBus for NullBus {
    fn publish_joints(&self, pose: &JointPose) -> MotionResult<()> {
        trace!(?pose, "joints");
        Ok(())
    }

    fn publish_cosmetics(&self, pose: &CosmeticPose) -> MotionResult<()> {
        trace!(?pose, "cosmetics");
        Ok(())
    }

    fn publish_illum(&self, illum: IllumWord) -> MotionResult<()> {
        trace!(word = illum.word(), "illum");
        Ok(())
    }

    fn publish_tone(&self, tone: ToneCommand) -> MotionResult<()> {
        trace!(?tone, "tone");
        Ok(())
    }

    fn publish_velocity(&self, velocity: &VelocityCommand) -> MotionResult<()> {
        trace!(?velocity, "velocity");
        Ok(())
    }

    fn publish_audio(&self, frame: &AudioFrame) -> MotionResult<()> {
        trace!(samples = frame.len(), "audio");
        Ok(())
    }
}
