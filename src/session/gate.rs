//! Stop Gate
//!
//! Sessions pass through the gate before executing each command. `stop`
//! closes it for commands not yet started; commands already executing run to
//! completion. `release` reopens it and wakes every waiting session at once.

use parking_lot::{Condvar, Mutex};

use crate::error::{ArborError, Result};

use super::CancelToken;

pub struct StopGate {
    running: Mutex<bool>,
    go: Condvar,
}

impl StopGate {
    /// A gate that starts open
    pub fn new() -> Self {
        Self {
            running: Mutex::new(true),
            go: Condvar::new(),
        }
    }

    /// Block until the gate is open or `token` is cancelled
    ///
    /// The token is checked under the gate mutex, and cancellers call
    /// [`StopGate::wake_all`] after cancelling, so no wake-up is lost.
    pub fn wait(&self, token: &CancelToken) -> Result<()> {
        let mut running = self.running.lock();
        loop {
            if token.is_cancelled() {
                return Err(ArborError::Cancelled);
            }
            if *running {
                return Ok(());
            }
            self.go.wait(&mut running);
        }
    }

    pub fn stop(&self) {
        *self.running.lock() = false;
        tracing::info!("Gate stopped");
    }

    pub fn release(&self) {
        let mut running = self.running.lock();
        *running = true;
        self.go.notify_all();
        tracing::info!("Gate released");
    }

    /// Wake all waiters without opening the gate (they re-check their tokens)
    pub fn wake_all(&self) {
        let _running = self.running.lock();
        self.go.notify_all();
    }

    pub fn is_running(&self) -> bool {
        *self.running.lock()
    }
}

impl Default for StopGate {
    fn default() -> Self {
        Self::new()
    }
}
