//! Signal Monitor
//!
//! Turns interrupt notifications into "cancel every session". The listener,
//! the admin channel and the monitor itself keep running, so clients can
//! reconnect right away.
//!
//! The monitor never touches OS signals itself: the server binary installs
//! the process's only SIGINT handler and forwards each delivery into the
//! channel the monitor reads.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};

use crate::context::ServerContext;
use crate::error::Result;

pub struct SignalMonitor {
    stop_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl SignalMonitor {
    /// Start watching `interrupts`
    pub fn spawn(ctx: Arc<ServerContext>, interrupts: Receiver<()>) -> Result<Self> {
        let (stop_tx, stop_rx) = channel::bounded(1);

        let thread = thread::Builder::new()
            .name("signal-monitor".to_string())
            .spawn(move || monitor(&ctx, &interrupts, &stop_rx))?;

        Ok(Self {
            stop_tx,
            thread: Some(thread),
        })
    }

    /// Cancel and join the monitor thread
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.stop_tx.try_send(());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Signal monitor thread panicked");
            }
        }
    }
}

impl Drop for SignalMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn monitor(ctx: &ServerContext, interrupts: &Receiver<()>, stop_rx: &Receiver<()>) {
    loop {
        channel::select! {
            recv(interrupts) -> msg => match msg {
                Ok(()) => {
                    tracing::info!("Interrupt received, cancelling all sessions");
                    ctx.cancel_sessions();
                }
                Err(_) => {
                    // No more interrupts can arrive; wait to be stopped
                    let _ = stop_rx.recv();
                    break;
                }
            },
            recv(stop_rx) -> _ => break,
        }
    }
    tracing::debug!("Signal monitor stopped");
}
