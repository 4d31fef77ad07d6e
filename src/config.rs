//! Configuration for ArborKV
//!
//! Centralized configuration with sensible defaults.

use crate::error::{ArborError, Result};

/// Main configuration for an ArborKV server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// How long the accept loop sleeps between polls of its stop flag
    pub accept_poll_interval_ms: u64,

    // -------------------------------------------------------------------------
    // Protocol Configuration
    // -------------------------------------------------------------------------
    /// Longest accepted command token (key, value or file name)
    pub max_token_len: usize,

    /// How many `f` commands may nest inside batch files
    pub max_batch_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8888".to_string(),
            accept_poll_interval_ms: 50,
            max_token_len: 255,
            max_batch_depth: 16,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.is_empty() {
            return Err(ArborError::Config("listen address is empty".to_string()));
        }
        if self.max_token_len == 0 {
            return Err(ArborError::Config("max_token_len must be positive".to_string()));
        }
        if self.accept_poll_interval_ms == 0 {
            return Err(ArborError::Config(
                "accept_poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the accept loop poll interval (in milliseconds)
    pub fn accept_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.accept_poll_interval_ms = ms;
        self
    }

    /// Set the longest accepted command token
    pub fn max_token_len(mut self, len: usize) -> Self {
        self.config.max_token_len = len;
        self
    }

    /// Set the batch file nesting limit
    pub fn max_batch_depth(mut self, depth: usize) -> Self {
        self.config.max_batch_depth = depth;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
