//! Session Module
//!
//! One worker thread per connected client.
//!
//! ## Lifecycle
//! ```text
//!  spawn ──► admit? ──no──► close connection
//!              │yes
//!              ▼
//!   ┌──► read command ──EOF/cancel──┐
//!   │         │                     │
//!   │    gate wait ──cancel─────────┤
//!   │         │                     ▼
//!   │     execute              cleanup (exactly once):
//!   │         │                  deregister, close connection,
//!   └── write response           decrement live count
//! ```

mod cancel;
mod gate;
mod registry;
mod worker;

pub use cancel::{CancelToken, Interrupter};
pub use gate::StopGate;
pub use registry::{SessionId, SessionRegistry};
pub use worker::Session;
