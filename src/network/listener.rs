//! TCP Listener
//!
//! Accepts connections and starts a session for each.

use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use crate::context::ServerContext;
use crate::error::Result;
use crate::session::Session;

use super::TcpConnection;

/// Bound, not yet accepting, TCP listener
pub struct Listener {
    listener: TcpListener,
    ctx: Arc<ServerContext>,
}

impl Listener {
    /// Bind to the configured listen address
    pub fn bind(ctx: Arc<ServerContext>) -> Result<Self> {
        let listener = TcpListener::bind(&ctx.config().listen_addr)?;
        // Non-blocking so the accept loop can notice a stop request
        listener.set_nonblocking(true)?;
        Ok(Self { listener, ctx })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Start the accept loop on its own thread
    pub fn spawn(self) -> Result<ListenerHandle> {
        let local_addr = self.local_addr()?;
        let (stop_tx, stop_rx) = channel::bounded(1);

        let thread = thread::Builder::new()
            .name("listener".to_string())
            .spawn(move || self.accept_loop(stop_rx))?;

        tracing::info!("Listening on {}", local_addr);
        Ok(ListenerHandle {
            local_addr,
            stop_tx,
            thread: Some(thread),
        })
    }

    fn accept_loop(self, stop_rx: Receiver<()>) {
        let poll_interval = Duration::from_millis(self.ctx.config().accept_poll_interval_ms);

        loop {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    tracing::debug!("Accepted connection from {}", addr);
                    if let Err(e) = self.start_session(stream) {
                        tracing::warn!("Could not start session for {}: {}", addr, e);
                    }
                    continue;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => tracing::warn!("Accept failed: {}", e),
            }

            match stop_rx.recv_timeout(poll_interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        tracing::debug!("Listener stopped");
    }

    fn start_session(&self, stream: std::net::TcpStream) -> Result<()> {
        stream.set_nonblocking(false)?;
        let connection = TcpConnection::new(stream)?;
        // Detached: the session deregisters itself
        Session::spawn(Arc::clone(&self.ctx), connection)?;
        Ok(())
    }
}

/// Running accept loop
pub struct ListenerHandle {
    local_addr: SocketAddr,
    stop_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting and join the accept thread
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.stop_tx.try_send(());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Listener thread panicked");
            }
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
