//! Session configuration loaded from the environment, with an optional
//! `miko.toml` overlay for hosts that prefer a file.
//!
//! Change behavior without code edits: relay depth, downlink gain, the
//! expressive hold window, blink cadence, and which remote participant
//! counts as the assistant's speaker.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Session configuration.
///
/// | Env | Default | Description |
/// |-----|---------|-------------|
/// | MIKO_ROBOT_NAME | miko | Robot name / topic base for the actuator bus. |
/// | MIKO_SPEAKER_NAME | Vapi Speaker | Remote participant treated as the assistant's speaker. |
/// | MIKO_ROOM_URL | (unset) | Call room to join; bridge stays off when unset. |
/// | MIKO_RELAY_CAPACITY | 32 | Relay queue depth in frames. |
/// | MIKO_DOWNLINK_GAIN | 3 | Saturating gain applied to relayed downlink audio. |
/// | MIKO_HOLD_SECS | 3.0 | Minimum dwell for happy/sad before a transition is honored. |
/// | MIKO_BLINK_INTERVAL_SECS | 6.0 | Idle blink cadence. |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    #[serde(default = "default_robot_name")]
    pub robot_name: String,
    #[serde(default = "default_speaker_name")]
    pub speaker_name: String,
    #[serde(default)]
    pub room_url: Option<String>,
    #[serde(default = "default_relay_capacity")]
    pub relay_capacity: usize,
    #[serde(default = "default_downlink_gain")]
    pub downlink_gain: i32,
    #[serde(default = "default_hold_secs")]
    pub hold_secs: f32,
    #[serde(default = "default_blink_interval_secs")]
    pub blink_interval_secs: f32,
}

fn default_robot_name() -> String {
    "miko".to_string()
}

fn default_speaker_name() -> String {
    "Vapi Speaker".to_string()
}

fn default_relay_capacity() -> usize {
    crate::relay::DEFAULT_RELAY_CAPACITY
}

fn default_downlink_gain() -> i32 {
    3
}

fn default_hold_secs() -> f32 {
    3.0
}

fn default_blink_interval_secs() -> f32 {
    6.0
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            robot_name: default_robot_name(),
            speaker_name: default_speaker_name(),
            room_url: None,
            relay_capacity: default_relay_capacity(),
            downlink_gain: default_downlink_gain(),
            hold_secs: default_hold_secs(),
            blink_interval_secs: default_blink_interval_secs(),
        }
    }
}

impl CoreConfig {
    /// Load from environment. Unset or invalid values fall back to defaults
    /// (see the table above).
    pub fn from_env() -> Self {
        Self {
            robot_name: env_string("MIKO_ROBOT_NAME", default_robot_name()),
            speaker_name: env_string("MIKO_SPEAKER_NAME", default_speaker_name()),
            room_url: env_opt_string("MIKO_ROOM_URL"),
            relay_capacity: env_parse("MIKO_RELAY_CAPACITY", default_relay_capacity()).max(1),
            downlink_gain: env_parse("MIKO_DOWNLINK_GAIN", default_downlink_gain()).max(1),
            hold_secs: env_parse("MIKO_HOLD_SECS", default_hold_secs()).max(0.0),
            blink_interval_secs: env_parse("MIKO_BLINK_INTERVAL_SECS", default_blink_interval_secs())
                .max(0.5),
        }
    }

    /// Load from a TOML file when it exists, otherwise from environment.
    pub fn load(path: &Path) -> Result<Self, toml::de::Error> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content),
            Err(_) => Ok(Self::from_env()),
        }
    }
}

fn env_string(name: &str, default: String) -> String {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
}

fn env_opt_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(v) => v.trim().parse().unwrap_or(default),
        Err(_) => default,
    }
}
