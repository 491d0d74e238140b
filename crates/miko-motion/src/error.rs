//! Error types for the behavior scheduler.

use thiserror::Error;

/// Result type alias for motion operations.
pub type MotionResult<T> = Result<T, MotionError>;

/// Errors that can occur while driving the robot.
#[derive(Error, Debug)]
pub enum MotionError {
    #[error("Actuator bus error: {0}")]
    Bus(String),

    #[error("Microphone control error: {0}")]
    Mic(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
