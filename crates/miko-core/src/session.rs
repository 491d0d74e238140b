//! Shared session state between the classification collaborator and the
//! behavior scheduler.
//!
//! The scheduler reads `requested_mode` once per tick at 50 Hz; the
//! webhook/classification path writes it occasionally. Writers must never
//! be able to block the scheduler, so both keys live in atomics behind a
//! cheaply cloneable handle — each collaborator gets a handle, not raw
//! shared memory.

use crate::mode::Mode;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct SessionShared {
    // Single-word keys with no ordering relationship to other memory;
    // relaxed loads/stores are atomic per key, which is the whole contract.
    requested_mode: AtomicU8,
    agent_speaking: AtomicBool,
}

/// Handle onto the session's shared state. Clone freely; all clones observe
/// the same session.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<SessionShared>,
}

impl SessionHandle {
    /// Fresh session state: `idle`, agent not speaking.
    pub fn new() -> Self {
        Self::default()
    }

    /// The mode the outside world currently wants the robot in.
    pub fn requested_mode(&self) -> Mode {
        Mode::from_u8(self.inner.requested_mode.load(Ordering::Relaxed))
    }

    pub fn set_requested_mode(&self, mode: Mode) {
        self.inner.requested_mode.store(mode.as_u8(), Ordering::Relaxed);
    }

    pub fn agent_speaking(&self) -> bool {
        self.inner.agent_speaking.load(Ordering::Relaxed)
    }

    pub fn set_agent_speaking(&self, speaking: bool) {
        self.inner.agent_speaking.store(speaking, Ordering::Relaxed);
    }
}
