//! Lossy audio relay between the bridge's downlink loop and the scheduler.
//!
//! Bounded SPSC FIFO of owned [`AudioFrame`]s. The producer never blocks:
//! when the queue is full the new frame is dropped and counted. The consumer
//! only ever polls. FIFO order is preserved for everything retained — drops
//! lose frames, never reorder them.

use crate::frame::AudioFrame;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::trace;

/// Default relay depth: 32 frames ≈ 2.5 s of audio at the 80 ms frame cadence.
pub const DEFAULT_RELAY_CAPACITY: usize = 32;

/// Create a relay pair with the given capacity in frames.
pub fn relay_channel(capacity: usize) -> (RelayProducer, RelayConsumer) {
    let (tx, rx) = bounded(capacity.max(1));
    (
        RelayProducer { tx, dropped: 0 },
        RelayConsumer { rx },
    )
}

/// Producing end, owned by the bridge's downlink loop.
pub struct RelayProducer {
    tx: Sender<AudioFrame>,
    dropped: u64,
}

impl RelayProducer {
    /// Push a frame, best-effort. Returns false when the frame was dropped
    /// (queue full or consumer gone); the downlink loop never blocks here.
    pub fn push(&mut self, frame: AudioFrame) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped += 1;
                trace!(dropped = self.dropped, "relay full, frame dropped");
                false
            }
        }
    }

    /// Frames dropped so far (full queue or missing consumer).
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Consuming end, polled by the scheduler once per tick.
pub struct RelayConsumer {
    rx: Receiver<AudioFrame>,
}

impl RelayConsumer {
    /// Non-blocking pop; `None` when no frame is waiting.
    pub fn try_pop(&self) -> Option<AudioFrame> {
        self.rx.try_recv().ok()
    }

    /// Frames currently queued.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_marker(marker: i16) -> AudioFrame {
        AudioFrame::from_samples(vec![marker; 4])
    }

    #[test]
    fn test_fifo_order_preserved() {
        let (mut tx, rx) = relay_channel(8);
        for i in 0..5 {
            assert!(tx.push(frame_with_marker(i)));
        }
        for i in 0..5 {
            assert_eq!(rx.try_pop().unwrap(), frame_with_marker(i));
        }
        assert!(rx.try_pop().is_none());
    }

    #[test]
    fn test_full_queue_drops_newest_keeps_order() {
        let (mut tx, rx) = relay_channel(3);
        for i in 0..6 {
            tx.push(frame_with_marker(i));
        }
        assert_eq!(tx.dropped(), 3);
        // Retained frames are the oldest three, still in order.
        for i in 0..3 {
            assert_eq!(rx.try_pop().unwrap(), frame_with_marker(i));
        }
        assert!(rx.try_pop().is_none());
    }

    #[test]
    fn test_push_without_consumer_is_non_fatal() {
        let (mut tx, rx) = relay_channel(2);
        drop(rx);
        assert!(!tx.push(frame_with_marker(0)));
        assert_eq!(tx.dropped(), 1);
    }

    #[test]
    fn test_empty_pop_is_none() {
        let (_tx, rx) = relay_channel(2);
        assert!(rx.is_empty());
        assert!(rx.try_pop().is_none());
    }
}
