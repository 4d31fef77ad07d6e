//! Network Module
//!
//! TCP listener and per-connection line I/O.
//!
//! ## Architecture
//! - Single acceptor thread
//! - One detached session thread per connection
//! - Commands routed through the Engine

mod connection;
mod listener;

use std::io;

use crate::protocol::Response;
use crate::session::Interrupter;

pub use connection::TcpConnection;
pub use listener::{Listener, ListenerHandle};

/// Line-oriented transport a session reads commands from
pub trait Transport: Send + 'static {
    /// Read the next command line without its terminator; `None` at end of stream
    fn read_command(&mut self) -> io::Result<Option<Vec<u8>>>;

    /// Write one response line
    fn write_response(&mut self, response: &Response) -> io::Result<()>;

    /// Callback that, invoked from any thread, unblocks a pending
    /// `read_command` and shuts the connection down
    fn interrupter(&self) -> io::Result<Interrupter>;

    /// Peer description for logging
    fn peer(&self) -> String {
        "unknown".to_string()
    }
}
