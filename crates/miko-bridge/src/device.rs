//! Local audio devices: frame-sized capture and playback over cpal.
//!
//! cpal drives its callbacks on its own thread, so the callbacks exchange
//! whole frames with the loop side over bounded channels. The loop side gets
//! a short blocking read with a timeout instead of an unbounded blocking
//! device call — a stuck device cannot wedge shutdown. Capture overflow
//! (loop not keeping up) silently drops the oldest unread audio at the
//! channel boundary; it is never an error.
//!
//! The cpal `Stream` is not `Send`, so opening a device returns two halves:
//! a guard that keeps the stream alive on the owning thread, and a
//! `Send` reader/writer that moves into the bridge loop.

use crate::error::{BridgeError, BridgeResult};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use miko_core::{AudioFrame, CHANNELS, FRAME_SAMPLES, SAMPLE_RATE};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Device configuration; defaults match the session-wide frame format.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count (1 = mono).
    pub channels: u16,
    /// Samples per frame.
    pub frame_samples: usize,
    /// Frames buffered between the cpal callback and the loop side.
    pub queue_frames: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            channels: CHANNELS,
            frame_samples: FRAME_SAMPLES,
            queue_frames: 8,
        }
    }
}

impl DeviceConfig {
    fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            channels: self.channels,
            sample_rate: SampleRate(self.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        }
    }
}

/// Capture side of the device pair.
pub trait AudioInput: Send {
    /// Read one frame; `Ok(None)` on timeout (no data yet). Overflow is
    /// tolerated silently upstream and never surfaces here.
    fn read_frame(&mut self, timeout: Duration) -> BridgeResult<Option<AudioFrame>>;
}

/// Playback side of the device pair.
pub trait AudioOutput: Send {
    fn write_frame(&mut self, frame: &AudioFrame) -> BridgeResult<()>;
}

/// Keeps the capture stream alive; dropping it stops capture.
pub struct InputStreamGuard {
    _stream: Stream,
}

/// Keeps the playback stream alive; dropping it stops playback.
pub struct OutputStreamGuard {
    _stream: Stream,
}

/// `Send` half of the capture device, handed to the uplink loop.
pub struct FrameReader {
    rx: Receiver<AudioFrame>,
}

impl AudioInput for FrameReader {
    fn read_frame(&mut self, timeout: Duration) -> BridgeResult<Option<AudioFrame>> {
        match self.rx.recv_timeout(timeout) {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(BridgeError::ChannelDisconnected(
                "capture stream closed".to_string(),
            )),
        }
    }
}

/// `Send` half of the playback device, handed to the downlink loop.
pub struct FrameWriter {
    tx: Sender<AudioFrame>,
}

impl AudioOutput for FrameWriter {
    fn write_frame(&mut self, frame: &AudioFrame) -> BridgeResult<()> {
        match self.tx.try_send(frame.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                // Playback overrun: device is behind, newest frame loses.
                trace!("playback queue full, frame dropped");
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(BridgeError::ChannelDisconnected(
                "playback stream closed".to_string(),
            )),
        }
    }
}

/// Open the default capture device at the session format.
pub fn open_input(config: DeviceConfig) -> BridgeResult<(InputStreamGuard, FrameReader)> {
    let device = cpal::default_host()
        .default_input_device()
        .ok_or_else(|| BridgeError::Device("no input device available".to_string()))?;
    debug!(
        device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
        sample_rate = config.sample_rate,
        "opening capture device"
    );

    let (tx, rx) = bounded(config.queue_frames.max(1));
    let frame_samples = config.frame_samples;
    let mut pending: Vec<i16> = Vec::with_capacity(frame_samples);

    let stream = device.build_input_stream(
        &config.stream_config(),
        move |data: &[i16], _: &cpal::InputCallbackInfo| {
            for &sample in data {
                pending.push(sample);
                if pending.len() >= frame_samples {
                    let frame = AudioFrame::from_samples(std::mem::replace(
                        &mut pending,
                        Vec::with_capacity(frame_samples),
                    ));
                    // Overflow: reader is behind, drop silently.
                    let _ = tx.try_send(frame);
                }
            }
        },
        |err| warn!("capture stream error: {}", err),
        None,
    )?;
    stream.play()?;

    Ok((InputStreamGuard { _stream: stream }, FrameReader { rx }))
}

/// Open the default playback device at the session format.
pub fn open_output(config: DeviceConfig) -> BridgeResult<(OutputStreamGuard, FrameWriter)> {
    let device = cpal::default_host()
        .default_output_device()
        .ok_or_else(|| BridgeError::Device("no output device available".to_string()))?;
    debug!(
        device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
        sample_rate = config.sample_rate,
        "opening playback device"
    );

    let (tx, rx) = bounded::<AudioFrame>(config.queue_frames.max(1));
    let mut leftover: Vec<i16> = Vec::new();
    let mut cursor = 0usize;

    let stream = device.build_output_stream(
        &config.stream_config(),
        move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
            for slot in data.iter_mut() {
                if cursor >= leftover.len() {
                    match rx.try_recv() {
                        Ok(frame) => {
                            leftover = frame.into_samples();
                            cursor = 0;
                        }
                        // Starved: play silence rather than stall the device.
                        Err(_) => {
                            *slot = 0;
                            continue;
                        }
                    }
                }
                *slot = leftover[cursor];
                cursor += 1;
            }
        },
        |err| warn!("playback stream error: {}", err),
        None,
    )?;
    stream.play()?;

    Ok((OutputStreamGuard { _stream: stream }, FrameWriter { tx }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_config_defaults_match_session_format() {
        let config = DeviceConfig::default();
        assert_eq!(config.sample_rate, 8_000);
        assert_eq!(config.channels, 1);
        assert_eq!(config.frame_samples, 640);
        assert!(config.queue_frames > 0);
    }

    #[test]
    fn test_frame_reader_timeout_is_none() {
        let (_tx, rx) = bounded(1);
        let mut reader = FrameReader { rx };
        assert!(reader
            .read_frame(Duration::from_millis(1))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_frame_reader_disconnect_is_error() {
        let (tx, rx) = bounded::<AudioFrame>(1);
        drop(tx);
        let mut reader = FrameReader { rx };
        assert!(reader.read_frame(Duration::from_millis(1)).is_err());
    }

    #[test]
    fn test_frame_writer_drops_on_full_without_error() {
        let (tx, _rx) = bounded(1);
        let mut writer = FrameWriter { tx };
        let frame = AudioFrame::silence();
        writer.write_frame(&frame).unwrap();
        // Queue full now; second write drops but does not fail.
        writer.write_frame(&frame).unwrap();
    }

    #[test]
    #[ignore = "requires audio hardware"]
    fn test_open_default_devices() {
        let input = open_input(DeviceConfig::default());
        let output = open_output(DeviceConfig::default());
        assert!(input.is_ok() || output.is_ok());
    }
}
