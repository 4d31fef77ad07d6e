//! Protocol Module
//!
//! Defines the line protocol for client-server communication.
//!
//! ## Protocol Format
//!
//! One command per line, ASCII, whitespace-separated tokens. The verb is a
//! single character; keys, values and file names are at most 255 bytes.
//!
//! ### Commands
//! ```text
//! ┌───────────────────┬──────────────────┬──────────────────────┐
//! │ Request           │ Success          │ Failure              │
//! ├───────────────────┼──────────────────┼──────────────────────┤
//! │ q <key>           │ <value>          │ not found            │
//! │ a <key> <value>   │ added            │ already in database  │
//! │ d <key>           │ removed          │ not in database      │
//! │ f <file>          │ file processed   │ bad file name        │
//! │ anything else     │                  │ ill-formed command   │
//! └───────────────────┴──────────────────┴──────────────────────┘
//! ```
//!
//! ### Response Format
//! One response line per command line.

mod command;
mod response;

pub use command::{Command, CommandType};
pub use response::Response;
