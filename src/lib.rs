//! # ArborKV
//!
//! A concurrent in-memory key-value server with:
//! - A binary search tree with one reader/writer lock per node
//! - Hand-over-hand locking so writers on disjoint subtrees run in parallel
//! - One worker thread per client, with stop/go control
//! - Orderly drain-then-teardown shutdown and interrupt handling
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Listener   │   │ Admin (stdin)│   │ SignalMonitor│
//! └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!        │ spawn            │ p / s / g / EOF  │ cancel all
//!        ▼                  ▼                  ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                   ServerContext                      │
//! │  SessionRegistry · StopGate · ShutdownCoordinator    │
//! └─────────────────────┬───────────────────────────────┘
//!                       │ one thread per client
//!                       ▼
//!               ┌──────────────┐
//!               │   Session    │──► Engine ──► ConcurrentTree
//!               └──────────────┘              (per-node RwLock)
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod tree;
pub mod protocol;
pub mod engine;
pub mod session;
pub mod shutdown;
pub mod context;
pub mod network;
pub mod signal;
pub mod admin;
pub mod server;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ArborError, Result};
pub use config::Config;
pub use context::ServerContext;
pub use engine::Engine;
pub use server::Server;
pub use tree::ConcurrentTree;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ArborKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
