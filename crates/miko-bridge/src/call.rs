//! The remote call transport boundary.
//!
//! The transport itself (join/leave, participant events, frame-level audio
//! I/O, app messages) is an external collaborator. Its callback style is
//! decoupled from bridge logic through [`CallEvent`]: the integration layer
//! turns SDK callbacks into events and feeds them to
//! [`AudioBridge::handle_event`](crate::AudioBridge::handle_event).

use crate::error::{BridgeError, BridgeResult};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use miko_core::AudioFrame;
use std::time::Duration;

/// Read-only view of a remote participant, as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallParticipant {
    pub id: String,
    pub user_name: String,
    pub mic_subscribed: bool,
    pub mic_playable: bool,
}

impl CallParticipant {
    /// True when this participant is the named assistant speaker and its
    /// microphone track has become subscribed and playable.
    pub fn is_playable_speaker(&self, speaker_name: &str) -> bool {
        self.user_name == speaker_name && self.mic_subscribed && self.mic_playable
    }
}

/// Transport-side events consumed by the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    /// Local input/output routing acknowledged as ready.
    InputsReady,
    /// Join completed; `error` carries the reason when it failed.
    Joined { error: Option<String> },
    /// A remote participant appeared or changed state.
    ParticipantUpdated(CallParticipant),
    /// A remote participant left the call.
    ParticipantLeft { id: String },
}

/// The remote call collaborator, reduced to what the bridge needs.
pub trait CallTransport: Send + Sync {
    /// Begin joining the room; completion arrives as [`CallEvent::Joined`].
    fn join(&self, url: &str) -> BridgeResult<()>;

    /// Outbound (uplink) audio sink; frames are forwarded verbatim.
    fn send_audio(&self, frame: &AudioFrame) -> BridgeResult<()>;

    /// Inbound (downlink) audio source. `Ok(None)` means no data yet — a
    /// normal condition, never an error.
    fn read_audio(&self, timeout: Duration) -> BridgeResult<Option<AudioFrame>>;

    /// Out-of-band application message.
    fn send_app_message(&self, message: &str) -> BridgeResult<()>;

    /// Leave the call.
    fn leave(&self) -> BridgeResult<()>;
}

/// In-process transport that echoes uplink frames back as downlink audio.
/// Useful for bring-up and end-to-end testing without a real room.
pub struct LoopbackTransport {
    tx: Sender<AudioFrame>,
    rx: Receiver<AudioFrame>,
}

impl LoopbackTransport {
    /// Echo transport holding at most `capacity` frames in flight.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self { tx, rx }
    }

    /// The startup events a real transport would deliver through its
    /// callbacks; the loopback "joins" instantly.
    pub fn startup_events() -> Vec<CallEvent> {
        vec![CallEvent::InputsReady, CallEvent::Joined { error: None }]
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new(8)
    }
}

impl CallTransport for LoopbackTransport {
    fn join(&self, _url: &str) -> BridgeResult<()> {
        Ok(())
    }

    fn send_audio(&self, frame: &AudioFrame) -> BridgeResult<()> {
        // Echo path is lossy on purpose; a stalled reader must not block
        // the uplink loop.
        match self.tx.try_send(frame.clone()) {
            Ok(()) | Err(TrySendError::Full(_)) => Ok(()),
            Err(TrySendError::Disconnected(_)) => Err(BridgeError::ChannelDisconnected(
                "loopback echo queue".to_string(),
            )),
        }
    }

    fn read_audio(&self, timeout: Duration) -> BridgeResult<Option<AudioFrame>> {
        match self.rx.recv_timeout(timeout) {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(BridgeError::ChannelDisconnected(
                "loopback echo queue".to_string(),
            )),
        }
    }

    fn send_app_message(&self, _message: &str) -> BridgeResult<()> {
        Ok(())
    }

    fn leave(&self) -> BridgeResult<()> {
        Ok(())
    }
}
