//! Server
//!
//! Wires the listener, signal monitor and admin console around one shared
//! `ServerContext` and runs the shutdown sequence.
//!
//! ## Shutdown Sequence
//! 1. Admin input reaches end of file
//! 2. Stop admitting sessions, cancel all live ones
//! 3. Wait for the live count to reach zero
//! 4. Free the tree
//! 5. Stop and join the signal monitor and the listener

use std::io::{BufRead, Write};
use std::net::SocketAddr;
use std::sync::Arc;

use crossbeam::channel::Receiver;

use crate::admin::AdminConsole;
use crate::config::Config;
use crate::context::ServerContext;
use crate::error::Result;
use crate::network::{Listener, ListenerHandle};
use crate::signal::SignalMonitor;

/// A running server
pub struct Server {
    ctx: Arc<ServerContext>,
    listener: ListenerHandle,
    monitor: SignalMonitor,
}

impl Server {
    /// Bind the listener and start the accept and interrupt threads
    pub fn start(config: Config, interrupts: Receiver<()>) -> Result<Self> {
        config.validate()?;
        let ctx = Arc::new(ServerContext::new(config));

        let monitor = SignalMonitor::spawn(Arc::clone(&ctx), interrupts)?;
        let listener = Listener::bind(Arc::clone(&ctx))?.spawn()?;

        Ok(Self {
            ctx,
            listener,
            monitor,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    pub fn context(&self) -> &Arc<ServerContext> {
        &self.ctx
    }

    /// Serve admin commands from `input` until it ends, then shut down
    ///
    /// Returns the number of tree nodes freed. The shutdown sequence runs
    /// even when reading `input` fails; that error is returned afterwards.
    pub fn run<R: BufRead, W: Write>(self, input: R, output: W) -> Result<usize> {
        let console = AdminConsole::new(&self.ctx, output).run(input);
        if let Err(e) = &console {
            tracing::error!("Admin input failed: {}", e);
        }
        let freed = self.shutdown();
        console.map(|()| freed)
    }

    /// Drain all sessions, free the tree, then stop the background threads
    pub fn shutdown(self) -> usize {
        let freed = self.ctx.shutdown();
        tracing::info!("Database clean complete ({} nodes freed)", freed);

        self.monitor.stop();
        self.listener.stop();
        freed
    }
}
