//! Per-mode step generators.
//!
//! Each mode's animation is a pure function of its own accumulated phase:
//! one owned struct per mode holding the phase fields, advanced by a fixed
//! per-tick increment and wrapped modulo 2π so accumulation can never
//! overflow. The structs write into the shared [`PoseState`] — the last
//! commanded posture, which persists across mode changes the way the real
//! robot's joints do — and publish through the bus.

use crate::bus::{CosmeticPose, IllumWord, JointPose, RobotBus, ToneCommand, VelocityCommand};
use crate::error::MotionResult;
use miko_core::Mode;
use std::f32::consts::TAU;

/// Last commanded posture; exit routines reset the channels their mode drove.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseState {
    pub joints: JointPose,
    pub cosmetics: CosmeticPose,
}

impl PoseState {
    pub fn neutral() -> Self {
        Self {
            joints: JointPose::neutral(),
            cosmetics: CosmeticPose::neutral(),
        }
    }
}

impl Default for PoseState {
    fn default() -> Self {
        Self::neutral()
    }
}

fn wrap(phase: f32) -> f32 {
    phase % TAU
}

/// Idle: purple light, slow tail wag, everything else at rest.
#[derive(Debug, Default)]
pub struct IdleStep {
    wag_phase: f32,
}

impl IdleStep {
    pub fn tick(&mut self, pose: &mut PoseState, bus: &dyn RobotBus) -> MotionResult<()> {
        bus.publish_illum(IllumWord::for_mode(Mode::Idle))?;
        self.wag_phase = wrap(self.wag_phase + TAU * 0.5 / 20.0);
        pose.cosmetics.wag = self.wag_phase.sin() * 0.5 + 0.5;
        bus.publish_cosmetics(&pose.cosmetics)?;
        bus.publish_joints(&pose.joints)?;
        Ok(())
    }
}

/// Happy: fast tail wag, head up, one chirp per dwell, gentle body sway.
#[derive(Debug, Default)]
pub struct HappyStep {
    wag_phase: f32,
    sway_phase: f32,
    tone_played: bool,
}

impl HappyStep {
    pub fn tick(&mut self, pose: &mut PoseState, bus: &dyn RobotBus) -> MotionResult<()> {
        self.wag_phase = wrap(self.wag_phase + std::f32::consts::PI * 5.0 / 50.0);
        pose.cosmetics.droop = 0.0;
        pose.cosmetics.wag = self.wag_phase.sin() * 0.5 + 0.5;
        pose.joints.lift = 22.0f32.to_radians();
        bus.publish_cosmetics(&pose.cosmetics)?;
        bus.publish_joints(&pose.joints)?;

        if !self.tone_played {
            bus.publish_tone(ToneCommand::happy_chirp())?;
            self.tone_played = true;
        }

        // sin(phase * 0.5) has period 4π, so wrap at two full turns.
        self.sway_phase = (self.sway_phase + 0.3) % (2.0 * TAU);
        bus.publish_velocity(&VelocityCommand {
            linear_x: 0.02 * self.sway_phase.sin(),
            angular_z: 0.5 * (self.sway_phase * 0.5).sin(),
        })?;
        Ok(())
    }

    /// Re-arm the chirp; called when leaving happy so the next dwell plays
    /// it again.
    pub fn rearm_tone(&mut self) {
        self.tone_played = false;
    }
}

/// Sad: drooped tail and ears, eyes closed, head low, slow side-to-side sway.
#[derive(Debug, Default)]
pub struct SadStep {
    phase: f32,
}

impl SadStep {
    pub fn tick(&mut self, pose: &mut PoseState, bus: &dyn RobotBus) -> MotionResult<()> {
        self.phase = wrap(self.phase + TAU * 0.3 / 50.0);
        pose.cosmetics.droop = 1.0;
        pose.cosmetics.wag = 0.1;
        pose.cosmetics.eyelid_left = 1.0;
        pose.cosmetics.eyelid_right = 1.0;
        pose.joints.yaw = (10.0 * self.phase.sin()).to_radians();
        pose.joints.lift = 150.0f32.to_radians();
        pose.joints.pitch = 250.0f32.to_radians();
        bus.publish_cosmetics(&pose.cosmetics)?;
        bus.publish_joints(&pose.joints)?;
        Ok(())
    }
}

/// Speaking: a small head nod in time with the agent's voice.
#[derive(Debug, Default)]
pub struct SpeakingStep {
    phase: f32,
}

impl SpeakingStep {
    pub fn tick(&mut self, pose: &mut PoseState, bus: &dyn RobotBus) -> MotionResult<()> {
        self.phase = wrap(self.phase + TAU * 1.5 / 20.0);
        pose.joints.pitch = (10.0 * self.phase.sin()).to_radians();
        bus.publish_joints(&pose.joints)?;
        Ok(())
    }
}

/// All per-mode generators. Listening has no per-tick animation — its
/// gesture happens entirely on entry — so it has no generator here.
#[derive(Debug, Default)]
pub struct StepBank {
    pub idle: IdleStep,
    pub happy: HappyStep,
    pub sad: SadStep,
    pub speaking: SpeakingStep,
}

impl StepBank {
    /// Run one tick of the active mode's generator.
    pub fn tick(
        &mut self,
        mode: Mode,
        pose: &mut PoseState,
        bus: &dyn RobotBus,
    ) -> MotionResult<()> {
        match mode {
            Mode::Idle => self.idle.tick(pose, bus),
            Mode::Happy => self.happy.tick(pose, bus),
            Mode::Sad => self.sad.tick(pose, bus),
            Mode::Speaking => self.speaking.tick(pose, bus),
            Mode::Listening => Ok(()),
        }
    }
}
