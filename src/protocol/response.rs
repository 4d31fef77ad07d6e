//! Response definitions
//!
//! Represents responses to clients.

use std::fmt;

/// A response line to send to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Value found by a query
    Value(Vec<u8>),
    NotFound,
    Added,
    AlreadyInDatabase,
    Removed,
    NotInDatabase,
    FileProcessed,
    BadFileName,
    IllFormed,
}

impl Response {
    /// Wire bytes of the response, without the line terminator
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Response::Value(value) => value.as_slice(),
            Response::NotFound => b"not found",
            Response::Added => b"added",
            Response::AlreadyInDatabase => b"already in database",
            Response::Removed => b"removed",
            Response::NotInDatabase => b"not in database",
            Response::FileProcessed => b"file processed",
            Response::BadFileName => b"bad file name",
            Response::IllFormed => b"ill-formed command",
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.as_bytes()))
    }
}
