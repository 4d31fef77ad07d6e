//! Shutdown Coordinator
//!
//! Tracks whether new sessions may be admitted and how many are still live.
//!
//! ## Phases (one-way)
//! ```text
//! Accepting ──begin_shutdown──► Draining ──mark_closed──► Closed
//! ```
//! A session is admitted only while `Accepting`, and its registration runs
//! under the coordinator lock, so once `begin_shutdown` returns no session
//! can slip into the registry unseen by the following cancel-all.

use parking_lot::{Condvar, Mutex};

/// Server lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Accepting,
    Draining,
    Closed,
}

#[derive(Debug)]
struct State {
    phase: Phase,
    live: usize,
}

pub struct ShutdownCoordinator {
    state: Mutex<State>,
    drained: Condvar,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                phase: Phase::Accepting,
                live: 0,
            }),
            drained: Condvar::new(),
        }
    }

    /// Count a new session and run `register` if still accepting
    ///
    /// Lock order: coordinator, then whatever `register` takes. Nothing
    /// acquires the two in the other order.
    pub fn admit<T>(&self, register: impl FnOnce() -> T) -> Option<T> {
        let mut state = self.state.lock();
        if state.phase != Phase::Accepting {
            return None;
        }
        state.live += 1;
        Some(register())
    }

    /// Called exactly once by every admitted session on exit
    pub fn session_finished(&self) {
        let mut state = self.state.lock();
        if state.live == 0 {
            tracing::error!("Session finished with no live sessions counted");
            return;
        }
        state.live -= 1;
        if state.live == 0 {
            self.drained.notify_all();
        }
    }

    /// Stop admitting sessions; false if shutdown had already begun
    pub fn begin_shutdown(&self) -> bool {
        let mut state = self.state.lock();
        if state.phase != Phase::Accepting {
            return false;
        }
        state.phase = Phase::Draining;
        tracing::info!("No longer accepting sessions ({} live)", state.live);
        true
    }

    /// Block until every admitted session has finished
    pub fn wait_for_drain(&self) {
        let mut state = self.state.lock();
        while state.live > 0 {
            self.drained.wait(&mut state);
        }
    }

    pub fn mark_closed(&self) {
        self.state.lock().phase = Phase::Closed;
    }

    pub fn phase(&self) -> Phase {
        self.state.lock().phase
    }

    pub fn is_accepting(&self) -> bool {
        self.phase() == Phase::Accepting
    }

    pub fn live_sessions(&self) -> usize {
        self.state.lock().live
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
