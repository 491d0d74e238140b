//! The audio bridge: uplink and downlink loops around the readiness gate.
//!
//! Uplink moves local capture frames verbatim to the call; downlink moves
//! call audio to the local speaker and pushes a gain-boosted copy onto the
//! relay queue for the behavior scheduler. Both loops run on dedicated
//! threads, start only once the [`StartGate`] opens, observe the quit flag
//! within one frame period, and are joined to completion before the
//! transport is left and devices are released.

use crate::call::{CallEvent, CallParticipant, CallTransport};
use crate::device::{AudioInput, AudioOutput};
use crate::error::BridgeResult;
use crate::gate::{GateOutcome, StartGate};
use miko_core::{AudioFrame, RelayProducer, FRAME_PERIOD};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Remote participant treated as the assistant's speaker.
    pub speaker_name: String,
    /// Gain applied to relayed downlink audio (saturating).
    pub gain: i32,
    /// How long the loops wait at the readiness gate before giving up.
    pub gate_timeout: Duration,
    /// Per-read timeout for both loops; one frame's natural cadence.
    pub frame_period: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            speaker_name: "Vapi Speaker".to_string(),
            gain: 3,
            gate_timeout: Duration::from_secs(15),
            frame_period: FRAME_PERIOD,
        }
    }
}

/// Saturating gain on one sample: clamped to the i16 range, never wrapped.
pub fn amplify(sample: i16, gain: i32) -> i16 {
    (sample as i32 * gain).clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

/// Saturating gain over a whole frame.
pub fn amplify_frame(frame: &AudioFrame, gain: i32) -> AudioFrame {
    AudioFrame::from_samples(frame.samples().iter().map(|&s| amplify(s, gain)).collect())
}

/// Bidirectional audio bridge between a remote call and local devices.
pub struct AudioBridge {
    transport: Arc<dyn CallTransport>,
    config: BridgeConfig,
    gate: Arc<StartGate>,
    quit: Arc<AtomicBool>,
    uplink: Option<JoinHandle<()>>,
    downlink: Option<JoinHandle<()>>,
    participants: HashMap<String, CallParticipant>,
    left: bool,
}

impl AudioBridge {
    pub fn new(transport: Arc<dyn CallTransport>, config: BridgeConfig) -> Self {
        Self {
            transport,
            config,
            gate: Arc::new(StartGate::new()),
            quit: Arc::new(AtomicBool::new(false)),
            uplink: None,
            downlink: None,
            participants: HashMap::new(),
            left: false,
        }
    }

    /// Issue the join and spawn both loops. Neither performs any I/O until
    /// the gate resolves; a gate failure aborts them with zero device calls.
    pub fn start(
        &mut self,
        input: Box<dyn AudioInput>,
        output: Box<dyn AudioOutput>,
        relay: Option<RelayProducer>,
        url: &str,
    ) -> BridgeResult<()> {
        info!(url, "joining call");
        self.transport.join(url)?;

        let uplink = {
            let gate = Arc::clone(&self.gate);
            let quit = Arc::clone(&self.quit);
            let transport = Arc::clone(&self.transport);
            let config = self.config.clone();
            thread::spawn(move || uplink_loop(input, transport, gate, quit, config))
        };
        let downlink = {
            let gate = Arc::clone(&self.gate);
            let quit = Arc::clone(&self.quit);
            let transport = Arc::clone(&self.transport);
            let config = self.config.clone();
            thread::spawn(move || downlink_loop(output, relay, transport, gate, quit, config))
        };
        self.uplink = Some(uplink);
        self.downlink = Some(downlink);
        Ok(())
    }

    /// Consume one transport event. Readiness events feed the gate;
    /// participant events drive the playable-speaker signal and the
    /// departure-triggered shutdown.
    pub fn handle_event(&mut self, event: CallEvent) {
        match event {
            CallEvent::InputsReady => self.gate.inputs_ready(),
            CallEvent::Joined { error } => {
                if let Some(reason) = &error {
                    warn!(reason, "join failed");
                }
                self.gate.joined(error);
            }
            CallEvent::ParticipantUpdated(participant) => {
                let was_playable = self
                    .participants
                    .get(&participant.id)
                    .map(|p| p.is_playable_speaker(&self.config.speaker_name))
                    .unwrap_or(false);
                let now_playable = participant.is_playable_speaker(&self.config.speaker_name);
                self.participants
                    .insert(participant.id.clone(), participant);
                if now_playable && !was_playable {
                    info!("speaker became playable");
                    if let Err(e) = self.transport.send_app_message("playable") {
                        warn!("app message failed: {}", e);
                    }
                }
            }
            CallEvent::ParticipantLeft { id } => {
                self.participants.remove(&id);
                info!(participant = %id, "participant left, ending session");
                if let Err(e) = self.leave() {
                    warn!("leave after departure failed: {}", e);
                }
            }
        }
    }

    /// Cooperative shutdown: raise the quit flag, join both loops, then
    /// leave the call. Devices are only released (dropped by the caller)
    /// after this returns, so no device I/O races teardown.
    pub fn leave(&mut self) -> BridgeResult<()> {
        if self.left {
            return Ok(());
        }
        self.left = true;
        self.quit.store(true, Ordering::Relaxed);
        // Wake loops still parked at the gate; no-op once resolved.
        self.gate.fail("bridge shutting down");
        if let Some(handle) = self.uplink.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.downlink.take() {
            let _ = handle.join();
        }
        debug!("both bridge loops joined");
        self.transport.leave()
    }

    pub fn is_running(&self) -> bool {
        self.uplink.is_some() || self.downlink.is_some()
    }
}

impl Drop for AudioBridge {
    fn drop(&mut self) {
        if let Err(e) = self.leave() {
            warn!("leave on drop failed: {}", e);
        }
    }
}

fn wait_at_gate(gate: &StartGate, timeout: Duration, loop_name: &str) -> bool {
    match gate.wait(timeout) {
        GateOutcome::Ready => true,
        GateOutcome::Failed(reason) => {
            warn!(loop_name, reason, "startup failed, loop exiting with no I/O");
            false
        }
        GateOutcome::TimedOut => {
            warn!(loop_name, "startup gate timed out, loop exiting with no I/O");
            false
        }
    }
}

fn uplink_loop(
    mut input: Box<dyn AudioInput>,
    transport: Arc<dyn CallTransport>,
    gate: Arc<StartGate>,
    quit: Arc<AtomicBool>,
    config: BridgeConfig,
) {
    if !wait_at_gate(&gate, config.gate_timeout, "uplink") {
        return;
    }
    debug!("uplink loop started");
    while !quit.load(Ordering::Relaxed) {
        match input.read_frame(config.frame_period) {
            Ok(Some(frame)) if !frame.is_empty() => {
                if let Err(e) = transport.send_audio(&frame) {
                    warn!("uplink send failed: {}", e);
                }
            }
            // Timeout or empty frame: normal, keep polling.
            Ok(_) => {}
            Err(e) => {
                warn!("capture read failed, uplink loop exiting: {}", e);
                break;
            }
        }
    }
    debug!("uplink loop exited");
}

fn downlink_loop(
    mut output: Box<dyn AudioOutput>,
    mut relay: Option<RelayProducer>,
    transport: Arc<dyn CallTransport>,
    gate: Arc<StartGate>,
    quit: Arc<AtomicBool>,
    config: BridgeConfig,
) {
    if !wait_at_gate(&gate, config.gate_timeout, "downlink") {
        return;
    }
    debug!("downlink loop started");
    while !quit.load(Ordering::Relaxed) {
        match transport.read_audio(config.frame_period) {
            Ok(Some(frame)) => {
                if let Err(e) = output.write_frame(&frame) {
                    warn!("playback write failed: {}", e);
                }
                if let Some(relay) = relay.as_mut() {
                    relay.push(amplify_frame(&frame, config.gain));
                }
            }
            // No data yet: normal, keep polling.
            Ok(None) => {}
            Err(e) => {
                warn!("downlink read failed, loop exiting: {}", e);
                break;
            }
        }
    }
    debug!("downlink loop exited");
}
