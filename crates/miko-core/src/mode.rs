//! The robot's expressive mode.
//!
//! Exactly one mode is active per session at any instant; `idle` is the
//! universal default and the fallback reached at teardown. The webhook
//! collaborator writes lowercase mode names, so the string round-trip
//! uses those.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Expressive/behavioral state of the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Default/fallback state. Gentle tail wag, periodic blink.
    #[default]
    Idle,
    /// Positive emotional beat: tail wag, chirp, body sway.
    Happy,
    /// Negative emotional beat: drooped posture, slow head sway.
    Sad,
    /// The remote agent is speaking: head nod.
    Speaking,
    /// The robot is listening: mic open, head turned toward the user.
    Listening,
}

/// Returned when parsing an unrecognized mode name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown mode: {0}")]
pub struct UnknownMode(pub String);

impl Mode {
    /// True for the modes that carry the transition hold time. Happy and sad
    /// must read as complete emotional beats; the reactive modes switch
    /// immediately.
    pub fn is_expressive(self) -> bool {
        matches!(self, Mode::Happy | Mode::Sad)
    }

    /// Lowercase name, matching what the classification collaborator writes.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::Happy => "happy",
            Mode::Sad => "sad",
            Mode::Speaking => "speaking",
            Mode::Listening => "listening",
        }
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Mode::Idle => 0,
            Mode::Happy => 1,
            Mode::Sad => 2,
            Mode::Speaking => 3,
            Mode::Listening => 4,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Mode {
        match value {
            1 => Mode::Happy,
            2 => Mode::Sad,
            3 => Mode::Speaking,
            4 => Mode::Listening,
            _ => Mode::Idle,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "idle" => Ok(Mode::Idle),
            "happy" => Ok(Mode::Happy),
            "sad" => Ok(Mode::Sad),
            "speaking" => Ok(Mode::Speaking),
            "listening" => Ok(Mode::Listening),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}
