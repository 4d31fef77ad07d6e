//! Command definitions
//!
//! Parses one request line into a command.

use std::path::PathBuf;

use crate::error::{ArborError, Result};

/// Command types, keyed by their verb character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Query = b'q',
    Add = b'a',
    Delete = b'd',
    Batch = b'f',
}

impl CommandType {
    const ALL: [CommandType; 4] = [
        CommandType::Query,
        CommandType::Add,
        CommandType::Delete,
        CommandType::Batch,
    ];

    /// The verb byte on the wire
    pub fn verb(self) -> u8 {
        self as u8
    }

    /// Verbs are exactly one byte
    fn from_verb(verb: &[u8]) -> Option<Self> {
        match verb {
            [byte] => Self::ALL.into_iter().find(|t| t.verb() == *byte),
            _ => None,
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Look up a key
    Query { key: Vec<u8> },

    /// Add a key that is not yet present
    Add { key: Vec<u8>, value: Vec<u8> },

    /// Delete a key
    Delete { key: Vec<u8> },

    /// Run every line of a file as a command, silently
    Batch { path: PathBuf },
}

impl Command {
    /// Parse a request line
    ///
    /// Tokens past the ones a verb needs are ignored. Any token longer than
    /// `max_token_len` makes the line ill-formed.
    pub fn parse(line: &[u8], max_token_len: usize) -> Result<Self> {
        let mut tokens = line
            .split(|b| b.is_ascii_whitespace())
            .filter(|token| !token.is_empty());

        let verb = tokens
            .next()
            .ok_or_else(|| ArborError::Protocol("empty command".to_string()))?;
        let command_type = CommandType::from_verb(verb).ok_or_else(|| {
            ArborError::Protocol(format!("unknown verb: {}", String::from_utf8_lossy(verb)))
        })?;

        let mut operand = |name: &str| -> Result<Vec<u8>> {
            let token = tokens
                .next()
                .ok_or_else(|| ArborError::Protocol(format!("missing {}", name)))?;
            if token.len() > max_token_len {
                return Err(ArborError::Protocol(format!(
                    "{} too long: {} bytes (max {})",
                    name,
                    token.len(),
                    max_token_len
                )));
            }
            Ok(token.to_vec())
        };

        match command_type {
            CommandType::Query => Ok(Command::Query {
                key: operand("key")?,
            }),
            CommandType::Add => {
                let key = operand("key")?;
                let value = operand("value")?;
                Ok(Command::Add { key, value })
            }
            CommandType::Delete => Ok(Command::Delete {
                key: operand("key")?,
            }),
            CommandType::Batch => {
                let name = String::from_utf8(operand("file name")?).map_err(|_| {
                    ArborError::Protocol("file name is not valid UTF-8".to_string())
                })?;
                Ok(Command::Batch {
                    path: PathBuf::from(name),
                })
            }
        }
    }

    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Query { .. } => CommandType::Query,
            Command::Add { .. } => CommandType::Add,
            Command::Delete { .. } => CommandType::Delete,
            Command::Batch { .. } => CommandType::Batch,
        }
    }
}
