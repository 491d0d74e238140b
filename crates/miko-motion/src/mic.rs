//! Capture-microphone control.
//!
//! The robot's mic is opened to the room only while listening; every other
//! mode keeps it muted. On the robot host this is the ALSA capture switch.

use crate::error::{MotionError, MotionResult};
use std::process::{Command, Stdio};
use tracing::debug;

/// Mute/unmute control over the local capture device.
pub trait MicControl: Send {
    fn is_muted(&mut self) -> MotionResult<bool>;
    fn mute(&mut self) -> MotionResult<()>;
    fn unmute(&mut self) -> MotionResult<()>;
}

/// ALSA-backed control via `amixer get/set Capture`.
#[derive(Debug, Default)]
pub struct AlsaMic;

impl AlsaMic {
    fn set_capture(&self, flag: &str) -> MotionResult<()> {
        let status = Command::new("amixer")
            .args(["set", "Capture", flag])
            .stdout(Stdio::null())
            .status()
            .map_err(|e| MotionError::Mic(format!("amixer set failed: {e}")))?;
        if !status.success() {
            return Err(MotionError::Mic(format!("amixer set exited with {status}")));
        }
        Ok(())
    }
}

impl MicControl for AlsaMic {
    fn is_muted(&mut self) -> MotionResult<bool> {
        let output = Command::new("amixer")
            .args(["get", "Capture"])
            .output()
            .map_err(|e| MotionError::Mic(format!("amixer get failed: {e}")))?;
        Ok(String::from_utf8_lossy(&output.stdout).contains("[off]"))
    }

    fn mute(&mut self) -> MotionResult<()> {
        debug!("muting capture");
        self.set_capture("nocap")
    }

    fn unmute(&mut self) -> MotionResult<()> {
        debug!("unmuting capture");
        self.set_capture("cap")
    }
}

/// In-memory control for hosts without ALSA (and for tests).
#[derive(Debug)]
pub struct NullMic {
    muted: bool,
}

impl Default for NullMic {
    fn default() -> Self {
        // Sessions start with the mic closed.
        Self { muted: true }
    }
}

impl NullMic {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MicControl for NullMic {
    fn is_muted(&mut self) -> MotionResult<bool> {
        Ok(self.muted)
    }

    fn mute(&mut self) -> MotionResult<()> {
        self.muted = true;
        Ok(())
    }

    fn unmute(&mut self) -> MotionResult<()> {
        self.muted = false;
        Ok(())
    }
}
