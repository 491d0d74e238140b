//! Single-fire startup readiness gate.
//!
//! Combines two asynchronous ready signals — local input routing
//! acknowledged, remote join completed — with AND semantics, plus an
//! OR-with-error escape: an error on either path resolves the gate
//! immediately so a failed startup can be observed instead of deadlocking.
//! Once resolved, the outcome never changes.

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// What a waiter observed at the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Both readiness signals arrived; I/O may begin.
    Ready,
    /// Startup failed; no I/O must be performed.
    Failed(String),
    /// The gate did not resolve within the wait window.
    TimedOut,
}

#[derive(Debug, Default)]
struct GateState {
    inputs_ready: bool,
    joined: bool,
    /// Set once, first resolution wins.
    resolved: Option<Result<(), String>>,
}

impl GateState {
    fn try_resolve_ready(&mut self) {
        if self.resolved.is_none() && self.inputs_ready && self.joined {
            self.resolved = Some(Ok(()));
        }
    }
}

/// One-time synchronization point both bridge loops wait on before their
/// first I/O operation.
#[derive(Debug, Default)]
pub struct StartGate {
    state: Mutex<GateState>,
    cvar: Condvar,
}

impl StartGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Local input/output routing has been acknowledged as ready.
    pub fn inputs_ready(&self) {
        let mut state = self.state.lock().unwrap();
        state.inputs_ready = true;
        state.try_resolve_ready();
        self.cvar.notify_all();
    }

    /// Remote join completed; `error` carries the failure when it did not
    /// succeed.
    pub fn joined(&self, error: Option<String>) {
        let mut state = self.state.lock().unwrap();
        match error {
            Some(reason) => {
                if state.resolved.is_none() {
                    state.resolved = Some(Err(reason));
                }
            }
            None => {
                state.joined = true;
                state.try_resolve_ready();
            }
        }
        self.cvar.notify_all();
    }

    /// Resolve the gate to failure from any path (device open failure,
    /// shutdown before startup completed). No-op once resolved.
    pub fn fail(&self, reason: impl Into<String>) {
        let mut state = self.state.lock().unwrap();
        if state.resolved.is_none() {
            state.resolved = Some(Err(reason.into()));
        }
        self.cvar.notify_all();
    }

    /// Block until the gate resolves or `timeout` elapses.
    pub fn wait(&self, timeout: Duration) -> GateOutcome {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock().unwrap();
        loop {
            if let Some(resolved) = &state.resolved {
                return match resolved {
                    Ok(()) => GateOutcome::Ready,
                    Err(reason) => GateOutcome::Failed(reason.clone()),
                };
            }
            let now = Instant::now();
            if now >= deadline {
                return GateOutcome::TimedOut;
            }
            let (guard, _timeout_result) = self
                .cvar
                .wait_timeout(state, deadline - now)
                .unwrap();
            state = guard;
        }
    }
}
