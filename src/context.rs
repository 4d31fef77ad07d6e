//! Server Context
//!
//! The shared state every unit of the server works against, built once at
//! startup and handed out behind an `Arc`.

use std::sync::Arc;

use crate::config::Config;
use crate::engine::Engine;
use crate::session::{CancelToken, SessionId, SessionRegistry, StopGate};
use crate::shutdown::ShutdownCoordinator;

pub struct ServerContext {
    config: Config,
    engine: Engine,
    registry: SessionRegistry,
    gate: StopGate,
    coordinator: ShutdownCoordinator,
}

impl ServerContext {
    pub fn new(config: Config) -> Self {
        Self {
            engine: Engine::new(config.clone()),
            config,
            registry: SessionRegistry::new(),
            gate: StopGate::new(),
            coordinator: ShutdownCoordinator::new(),
        }
    }

    /// Register a session if the server is still accepting
    pub fn admit(&self, token: Arc<CancelToken>) -> Option<SessionId> {
        self.coordinator.admit(|| self.registry.insert(token))
    }

    /// Cancel every live session
    ///
    /// Shared by the shutdown path and the interrupt monitor.
    pub fn cancel_sessions(&self) -> usize {
        let cancelled = self.registry.cancel_all();
        self.gate.wake_all();
        tracing::info!("Cancelled {} sessions", cancelled);
        cancelled
    }

    /// Stop admitting, cancel and drain all sessions, then free the tree
    ///
    /// Returns the number of tree nodes freed; a repeated call frees nothing.
    pub fn shutdown(&self) -> usize {
        self.coordinator.begin_shutdown();
        self.cancel_sessions();
        self.coordinator.wait_for_drain();
        tracing::info!("All sessions drained, cleaning up database");

        let freed = self.engine.teardown();
        self.coordinator.mark_closed();
        freed
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn gate(&self) -> &StopGate {
        &self.gate
    }

    pub fn coordinator(&self) -> &ShutdownCoordinator {
        &self.coordinator
    }
}
