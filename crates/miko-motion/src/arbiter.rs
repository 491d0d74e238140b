//! Mode arbitration with hysteresis.
//!
//! The arbiter owns the active mode and decides, once per tick, whether the
//! externally requested mode may take effect. Expressive modes (happy, sad)
//! are held for a minimum dwell after entry so the gesture reads as
//! complete; all other modes switch on the tick after they are requested.
//! A request arriving during the hold is latched as pending (the newest one
//! overwrites earlier ones) and committed once the hold expires.

use miko_core::Mode;
use std::time::{Duration, Instant};
use tracing::debug;

/// A transition the arbiter has committed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChange {
    pub from: Mode,
    pub to: Mode,
}

/// Decides when the requested mode becomes the active mode.
#[derive(Debug)]
pub struct ModeArbiter {
    hold: Duration,
    active: Mode,
    entered_at: Instant,
    pending: Option<Mode>,
}

impl ModeArbiter {
    pub fn new(initial: Mode, hold: Duration, now: Instant) -> Self {
        Self {
            hold,
            active: initial,
            entered_at: now,
            pending: None,
        }
    }

    pub fn active(&self) -> Mode {
        self.active
    }

    /// Reconcile the requested mode against the active one. At most one
    /// transition is committed per call; `None` means nothing changes this
    /// tick.
    pub fn decide(&mut self, requested: Mode, now: Instant) -> Option<ModeChange> {
        let holding = self.active.is_expressive()
            && now.duration_since(self.entered_at) < self.hold;

        if requested != self.active {
            if holding {
                if self.pending != Some(requested) {
                    debug!(active = %self.active, requested = %requested, "holding expressive mode");
                    self.pending = Some(requested);
                }
                return None;
            }
            return Some(self.commit(requested, now));
        }

        match self.pending {
            Some(pending) if !holding => Some(self.commit(pending, now)),
            _ => None,
        }
    }

    fn commit(&mut self, to: Mode, now: Instant) -> ModeChange {
        let change = ModeChange {
            from: self.active,
            to,
        };
        self.active = to;
        self.entered_at = now;
        self.pending = None;
        change
    }

    /// Force the active mode without running the hold rules. Used at startup
    /// and when a mode's step routine fails and the session falls back.
    pub fn reset_to(&mut self, mode: Mode, now: Instant) {
        self.active = mode;
        self.entered_at = now;
        self.pending = None;
    }
}
