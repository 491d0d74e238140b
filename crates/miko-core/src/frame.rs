//! The fixed-format audio unit moved between the call, the local devices
//! and the relay queue.
//!
//! Everything in the session speaks the same format: 640 signed 16-bit PCM
//! samples, mono, 8 kHz — one frame every 80 ms. Frames are owned values;
//! ownership transfers on every queue push, never shared mutation.

use std::time::Duration;

/// Session-wide sample rate in Hz.
pub const SAMPLE_RATE: u32 = 8_000;

/// Mono everywhere.
pub const CHANNELS: u16 = 1;

/// Samples per frame.
pub const FRAME_SAMPLES: usize = 640;

/// Natural cadence of one frame (640 samples at 8 kHz).
pub const FRAME_PERIOD: Duration = Duration::from_millis(80);

/// One frame of signed 16-bit PCM audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    samples: Vec<i16>,
}

impl AudioFrame {
    /// A full frame of silence.
    pub fn silence() -> Self {
        Self {
            samples: vec![0; FRAME_SAMPLES],
        }
    }

    /// Wrap raw samples. The bridge validates frame length at the device
    /// boundary; hops after that trust it.
    pub fn from_samples(samples: Vec<i16>) -> Self {
        debug_assert!(samples.len() <= FRAME_SAMPLES);
        Self { samples }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
