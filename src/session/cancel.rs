//! Cancellation token
//!
//! Each session owns one token. Cancelling it raises a flag the session
//! checks at every suspension point and fires the connection interrupter so
//! a blocked read returns immediately.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

/// Callback that unblocks and closes a connection from another thread
pub type Interrupter = Box<dyn Fn() + Send + Sync>;

#[derive(Default)]
pub struct CancelToken {
    cancelled: AtomicBool,
    interrupter: Mutex<Option<Interrupter>>,
}

impl CancelToken {
    /// Token with nothing to interrupt
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that shuts its connection down when cancelled
    pub fn with_interrupter(interrupter: Interrupter) -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            interrupter: Mutex::new(Some(interrupter)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Request cancellation; returns false if it was already requested
    pub fn cancel(&self) -> bool {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return false;
        }
        if let Some(interrupt) = self.interrupter.lock().as_ref() {
            interrupt();
        }
        true
    }

    /// Close the connection for good; later cancels have nothing to interrupt
    pub fn close_connection(&self) {
        if let Some(interrupt) = self.interrupter.lock().take() {
            interrupt();
        }
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
