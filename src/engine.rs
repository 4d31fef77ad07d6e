//! Engine Module
//!
//! Executes client commands against the tree.
//!
//! ## Responsibilities
//! - Parse request lines and dispatch them to the tree
//! - Resolve every per-command failure into a `Response`
//! - Run batch files line by line
//! - Write tree dumps to a sink or a file

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::config::Config;
use crate::error::Result;
use crate::protocol::{Command, Response};
use crate::session::CancelToken;
use crate::tree::{ConcurrentTree, Insert, Remove};

/// Command dispatcher over the concurrent tree
///
/// Stateless apart from the tree; every method takes `&self` and is safe to
/// call from any number of session threads.
pub struct Engine {
    config: Config,
    tree: ConcurrentTree,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            tree: ConcurrentTree::new(),
        }
    }

    /// Parse and execute one request line
    pub fn execute_line(&self, line: &[u8], token: &CancelToken) -> Response {
        self.execute_line_at(line, token, 0)
    }

    /// Execute a parsed command
    pub fn execute(&self, command: Command, token: &CancelToken) -> Response {
        self.execute_at(command, token, 0)
    }

    fn execute_line_at(&self, line: &[u8], token: &CancelToken, depth: usize) -> Response {
        match Command::parse(line, self.config.max_token_len) {
            Ok(command) => self.execute_at(command, token, depth),
            Err(e) => {
                tracing::trace!("Rejected command: {}", e);
                Response::IllFormed
            }
        }
    }

    fn execute_at(&self, command: Command, token: &CancelToken, depth: usize) -> Response {
        match command {
            Command::Query { key } => match self.tree.query(&key) {
                Some(value) => Response::Value(value),
                None => Response::NotFound,
            },
            Command::Add { key, value } => match self.tree.insert(&key, &value) {
                Ok(Insert::Added) => Response::Added,
                Ok(Insert::AlreadyExists) => Response::AlreadyInDatabase,
                Err(e) => {
                    tracing::trace!("Rejected add: {}", e);
                    Response::IllFormed
                }
            },
            Command::Delete { key } => match self.tree.remove(&key) {
                Remove::Removed => Response::Removed,
                Remove::NotFound => Response::NotInDatabase,
            },
            Command::Batch { path } => self.run_batch(&path, token, depth),
        }
    }

    /// Execute every line of `path`, discarding the per-line responses
    ///
    /// Cancellation is checked between lines.
    fn run_batch(&self, path: &Path, token: &CancelToken, depth: usize) -> Response {
        if depth >= self.config.max_batch_depth {
            tracing::warn!("Batch nesting too deep at {}", path.display());
            return Response::BadFileName;
        }

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                tracing::debug!("Cannot open batch file {}: {}", path.display(), e);
                return Response::BadFileName;
            }
        };

        let mut reader = BufReader::new(file);
        let mut line = Vec::new();
        loop {
            if token.is_cancelled() {
                break;
            }
            line.clear();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => break,
                Ok(_) => {
                    self.execute_line_at(&line, token, depth + 1);
                }
                Err(e) => {
                    tracing::warn!("Error reading batch file {}: {}", path.display(), e);
                    break;
                }
            }
        }

        Response::FileProcessed
    }

    /// Dump the tree to `sink`
    pub fn dump_to<W: Write>(&self, sink: &mut W) -> Result<()> {
        self.tree.dump(sink)?;
        sink.flush()?;
        Ok(())
    }

    /// Dump the tree to `path`, replacing any existing file
    pub fn dump_to_file(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.dump_to(&mut out)
    }

    /// Free every node; see [`ConcurrentTree::teardown`]
    pub fn teardown(&self) -> usize {
        self.tree.teardown()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn tree(&self) -> &ConcurrentTree {
        &self.tree
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
