//! Admin Console
//!
//! The operator's line-oriented control channel (normally stdin):
//!
//! ```text
//! p [file]   dump the tree to the console, or overwrite `file`
//! s          stop: sessions hold their next command
//! g          go: release held sessions
//! <EOF>      begin orderly shutdown
//! ```

use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::context::ServerContext;
use crate::error::Result;

/// A parsed admin line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Print(Option<PathBuf>),
    Stop,
    Go,
}

impl AdminCommand {
    /// `None` for blank or unrecognised lines
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        match tokens.next()? {
            "p" => Some(AdminCommand::Print(tokens.next().map(PathBuf::from))),
            "s" => Some(AdminCommand::Stop),
            "g" => Some(AdminCommand::Go),
            _ => None,
        }
    }
}

pub struct AdminConsole<'a, W: Write> {
    ctx: &'a ServerContext,
    out: W,
}

impl<'a, W: Write> AdminConsole<'a, W> {
    pub fn new(ctx: &'a ServerContext, out: W) -> Self {
        Self { ctx, out }
    }

    /// Process admin lines until end of input
    ///
    /// Lines that are not valid UTF-8 are decoded lossily. Only a failed
    /// read of `input` ends the loop early.
    pub fn run<R: BufRead>(&mut self, mut input: R) -> Result<()> {
        let mut raw = Vec::new();
        loop {
            raw.clear();
            if input.read_until(b'\n', &mut raw)? == 0 {
                tracing::info!("Admin input closed");
                return Ok(());
            }

            let line = String::from_utf8_lossy(&raw);
            match AdminCommand::parse(&line) {
                Some(command) => self.execute(command),
                None if line.trim().is_empty() => {}
                None => {
                    tracing::warn!("Unknown admin command: {:?}", line.trim());
                    self.reply("unknown command");
                }
            }
        }
    }

    /// Run one command; failures are reported on the console and logged
    pub fn execute(&mut self, command: AdminCommand) {
        match command {
            AdminCommand::Print(None) => {
                if let Err(e) = self.ctx.engine().dump_to(&mut self.out) {
                    tracing::warn!("Dump to console failed: {}", e);
                    self.reply("could not write dump");
                }
            }
            AdminCommand::Print(Some(path)) => {
                if let Err(e) = self.ctx.engine().dump_to_file(&path) {
                    tracing::warn!("Dump to {} failed: {}", path.display(), e);
                    self.reply(&format!("could not write {}", path.display()));
                }
            }
            AdminCommand::Stop => {
                self.ctx.gate().stop();
                self.reply("All clients stopped");
            }
            AdminCommand::Go => {
                self.ctx.gate().release();
                self.reply("All clients resumed");
            }
        }
    }

    fn reply(&mut self, message: &str) {
        let written = writeln!(self.out, "{}", message).and_then(|()| self.out.flush());
        if let Err(e) = written {
            tracing::warn!("Admin output failed: {}", e);
        }
    }
}
