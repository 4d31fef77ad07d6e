//! Session worker
//!
//! Runs the command loop for one connection.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::context::ServerContext;
use crate::network::Transport;

use super::{CancelToken, SessionId};

/// Entry point for per-connection workers
pub struct Session;

impl Session {
    /// Start a detached worker thread for `transport`
    ///
    /// The returned handle may be dropped; the session cleans up after itself.
    /// If the server has stopped accepting, the worker closes the connection
    /// without registering.
    pub fn spawn<T: Transport>(ctx: Arc<ServerContext>, transport: T) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("session".to_string())
            .spawn(move || run(ctx, transport))
    }
}

fn run<T: Transport>(ctx: Arc<ServerContext>, mut transport: T) {
    let peer = transport.peer();

    let token = match transport.interrupter() {
        Ok(interrupter) => Arc::new(CancelToken::with_interrupter(interrupter)),
        Err(e) => {
            tracing::warn!("Could not set up connection from {}: {}", peer, e);
            return;
        }
    };

    let Some(id) = ctx.admit(Arc::clone(&token)) else {
        tracing::debug!("Rejecting {}: server is not accepting sessions", peer);
        token.close_connection();
        return;
    };

    let _cleanup = Cleanup {
        ctx: &ctx,
        id,
        token: &token,
    };
    tracing::debug!("{} started for {}", id, peer);

    serve(&ctx, &mut transport, &token, id);
}

fn serve<T: Transport>(ctx: &ServerContext, transport: &mut T, token: &CancelToken, id: SessionId) {
    while !token.is_cancelled() {
        let line = match transport.read_command() {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::debug!("{} reached end of stream", id);
                return;
            }
            Err(e) => {
                tracing::warn!("{} read failed: {}", id, e);
                return;
            }
        };

        // A command read while stopped is held here, not executed
        if ctx.gate().wait(token).is_err() {
            tracing::debug!("{} cancelled at the gate", id);
            return;
        }

        tracing::trace!("{} executing {:?}", id, String::from_utf8_lossy(&line));
        let response = ctx.engine().execute_line(&line, token);

        if let Err(e) = transport.write_response(&response) {
            tracing::debug!("{} could not write response: {}", id, e);
            return;
        }
    }
    tracing::debug!("{} cancelled", id);
}

/// Runs the session's teardown on every exit path, unwinding included
struct Cleanup<'a> {
    ctx: &'a ServerContext,
    id: SessionId,
    token: &'a CancelToken,
}

impl Drop for Cleanup<'_> {
    fn drop(&mut self) {
        self.ctx.registry().remove(self.id);
        self.token.close_connection();
        self.ctx.coordinator().session_finished();
        tracing::debug!("{} finished", self.id);
    }
}
