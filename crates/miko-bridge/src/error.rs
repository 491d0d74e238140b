//! Error types for the audio bridge.

use thiserror::Error;

/// Result type alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors that can occur in the audio bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Audio device error: {0}")]
    Device(String),

    #[error("Audio stream error: {0}")]
    Stream(String),

    #[error("Call transport error: {0}")]
    Transport(String),

    #[error("Join failed: {0}")]
    Join(String),

    #[error("Startup gate failed: {0}")]
    Gate(String),

    #[error("Channel disconnected: {0}")]
    ChannelDisconnected(String),
}

impl From<cpal::DevicesError> for BridgeError {
    fn from(err: cpal::DevicesError) -> Self {
        BridgeError::Device(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for BridgeError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        BridgeError::Device(err.to_string())
    }
}

impl From<cpal::BuildStreamError> for BridgeError {
    fn from(err: cpal::BuildStreamError) -> Self {
        BridgeError::Stream(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for BridgeError {
    fn from(err: cpal::PlayStreamError) -> Self {
        BridgeError::Stream(err.to_string())
    }
}
