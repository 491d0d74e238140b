//! The 50 Hz behavior loop.
//!
//! Each tick captures one `now`, runs the arbiter against the session's
//! requested mode, plays the exit/entry routines around any committed
//! transition, advances the active mode's step generator, blinks when idle,
//! and republishes relayed call audio on the robot's audio-out channel.
//! The loop steps on absolute deadlines so a blink hold does not push every
//! later tick back by the same amount.

use crate::arbiter::ModeArbiter;
use crate::bus::{IllumWord, JointPose, RobotBus, VelocityCommand};
use crate::error::MotionResult;
use crate::mic::MicControl;
use crate::steps::{PoseState, StepBank};
use miko_core::{CoreConfig, Mode, RelayConsumer, SessionHandle};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Loop timing knobs. Defaults match the robot's real cadence.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Tick period of the control loop.
    pub tick_period: Duration,
    /// Minimum dwell for happy/sad before a transition is honored.
    pub hold: Duration,
    /// How often the eyes blink while idle.
    pub blink_interval: Duration,
    /// How long the eyes stay shut during a blink.
    pub blink_hold: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(20),
            hold: Duration::from_secs(3),
            blink_interval: Duration::from_secs(6),
            blink_hold: Duration::from_millis(500),
        }
    }
}

impl SchedulerConfig {
    pub fn from_core(config: &CoreConfig) -> Self {
        Self {
            hold: Duration::from_secs_f32(config.hold_secs),
            blink_interval: Duration::from_secs_f32(config.blink_interval_secs),
            ..Self::default()
        }
    }
}

/// Drives the robot from the shared session state.
pub struct BehaviorScheduler {
    session: SessionHandle,
    relay: RelayConsumer,
    bus: Arc<dyn RobotBus>,
    mic: Box<dyn MicControl>,
    config: SchedulerConfig,
    arbiter: ModeArbiter,
    steps: StepBank,
    pose: PoseState,
    last_blink: Instant,
}

impl BehaviorScheduler {
    pub fn new(
        session: SessionHandle,
        relay: RelayConsumer,
        bus: Arc<dyn RobotBus>,
        mic: Box<dyn MicControl>,
        config: SchedulerConfig,
    ) -> Self {
        let now = Instant::now();
        Self {
            session,
            relay,
            bus,
            mic,
            arbiter: ModeArbiter::new(Mode::Idle, config.hold, now),
            config,
            steps: StepBank::default(),
            pose: PoseState::neutral(),
            last_blink: now,
        }
    }

    pub fn active_mode(&self) -> Mode {
        self.arbiter.active()
    }

    /// Run until `stop` is raised. Blocks the calling thread.
    pub fn run(&mut self, stop: &AtomicBool) {
        self.startup_reset();
        info!(period_ms = self.config.tick_period.as_millis() as u64, "behavior loop running");

        let mut next = Instant::now();
        while !stop.load(Ordering::Relaxed) {
            next += self.config.tick_period;
            self.tick(Instant::now());
            match next.checked_duration_since(Instant::now()) {
                Some(wait) => thread::sleep(wait),
                // A blink hold overran the deadline; restart the cadence
                // from here instead of bursting to catch up.
                None => next = Instant::now(),
            }
        }
        self.shutdown();
    }

    /// Park the robot in the neutral idle posture with the mic closed.
    pub fn startup_reset(&mut self) {
        if let Err(err) = self.mic.mute() {
            warn!(%err, "startup mic mute failed");
        }
        self.pose = PoseState::neutral();
        log_publish(self.bus.publish_joints(&self.pose.joints), "joints");
        log_publish(self.bus.publish_cosmetics(&self.pose.cosmetics), "cosmetics");
        log_publish(self.bus.publish_illum(IllumWord::for_mode(Mode::Idle)), "illum");
        self.last_blink = Instant::now();
    }

    /// One loop iteration with `now` as the tick-atomic timestamp.
    pub fn tick(&mut self, now: Instant) {
        let requested = if self.session.agent_speaking() {
            Mode::Speaking
        } else {
            self.session.requested_mode()
        };

        if let Some(change) = self.arbiter.decide(requested, now) {
            info!(from = %change.from, to = %change.to, "mode change");
            self.exit_mode(change.from);
            self.enter_mode(change.to);
        }

        let active = self.arbiter.active();
        if let Err(err) = self.steps.tick(active, &mut self.pose, self.bus.as_ref()) {
            warn!(mode = %active, %err, "step failed, falling back to idle");
            self.exit_mode(active);
            self.arbiter.reset_to(Mode::Idle, now);
            self.enter_mode(Mode::Idle);
        }

        if self.arbiter.active() == Mode::Idle {
            self.blink_if_due(now);
        }

        self.republish_audio();
    }

    fn enter_mode(&mut self, to: Mode) {
        log_publish(self.bus.publish_illum(IllumWord::for_mode(to)), "illum");
        if to == Mode::Listening {
            if let Err(err) = self.mic.unmute() {
                warn!(%err, "mic unmute failed");
            }
            // Cock the head a random way and perk the ears toward the room.
            let yaw_deg: f32 = rand::thread_rng().gen_range(-35.0..=35.0);
            self.pose.joints.yaw = yaw_deg.to_radians();
            self.pose.cosmetics.ear_left = 0.0;
            self.pose.cosmetics.ear_right = 0.0;
            log_publish(self.bus.publish_joints(&self.pose.joints), "joints");
            log_publish(self.bus.publish_cosmetics(&self.pose.cosmetics), "cosmetics");
        }
    }

    // Each exit resets exactly the channels its mode drives.
    fn exit_mode(&mut self, from: Mode) {
        match from {
            Mode::Happy => {
                log_publish(self.bus.publish_velocity(&VelocityCommand::stop()), "velocity");
                self.steps.happy.rearm_tone();
                self.pose.joints.lift = JointPose::neutral().lift;
                log_publish(self.bus.publish_joints(&self.pose.joints), "joints");
            }
            Mode::Sad => {
                self.pose = PoseState::neutral();
                log_publish(self.bus.publish_cosmetics(&self.pose.cosmetics), "cosmetics");
                log_publish(self.bus.publish_joints(&self.pose.joints), "joints");
            }
            Mode::Speaking => {
                self.pose.joints.pitch = 0.0;
                log_publish(self.bus.publish_joints(&self.pose.joints), "joints");
            }
            Mode::Listening => {
                if let Err(err) = self.mic.mute() {
                    warn!(%err, "mic mute failed");
                }
                self.pose.joints.yaw = 0.0;
                self.pose.cosmetics.ear_left = 0.5;
                self.pose.cosmetics.ear_right = 0.5;
                log_publish(self.bus.publish_joints(&self.pose.joints), "joints");
                log_publish(self.bus.publish_cosmetics(&self.pose.cosmetics), "cosmetics");
            }
            Mode::Idle => {}
        }
    }

    fn blink_if_due(&mut self, now: Instant) {
        if now.duration_since(self.last_blink) < self.config.blink_interval {
            return;
        }
        self.pose.cosmetics.eyelid_left = 1.0;
        self.pose.cosmetics.eyelid_right = 1.0;
        log_publish(self.bus.publish_cosmetics(&self.pose.cosmetics), "cosmetics");
        thread::sleep(self.config.blink_hold);
        self.pose.cosmetics.eyelid_left = 0.0;
        self.pose.cosmetics.eyelid_right = 0.0;
        log_publish(self.bus.publish_cosmetics(&self.pose.cosmetics), "cosmetics");
        self.last_blink = now;
    }

    fn republish_audio(&mut self) {
        while let Some(frame) = self.relay.try_pop() {
            log_publish(self.bus.publish_audio(&frame), "audio");
        }
    }

    fn shutdown(&mut self) {
        info!("behavior loop stopping");
        self.exit_mode(self.arbiter.active());
        log_publish(self.bus.publish_illum(IllumWord::for_mode(Mode::Idle)), "illum");
        if let Err(err) = self.mic.mute() {
            warn!(%err, "shutdown mic mute failed");
        }
    }
}

fn log_publish(result: MotionResult<()>, channel: &str) {
    if let Err(err) = result {
        warn!(channel, %err, "publish failed");
    }
}
