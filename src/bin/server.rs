//! ArborKV Server Binary
//!
//! Starts the TCP server and reads admin commands from stdin.

use std::io;

use arborkv::{Config, Server};
use clap::Parser;
use crossbeam::channel;
use tracing_subscriber::{fmt, EnvFilter};

/// ArborKV Server
#[derive(Parser, Debug)]
#[command(name = "arborkv-server")]
#[command(about = "Concurrent in-memory key-value server")]
#[command(version)]
struct Args {
    /// TCP port to listen on
    port: u16,

    /// Interface to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Maximum nesting of `f` batch commands
    #[arg(long, default_value = "16")]
    max_batch_depth: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,arborkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("ArborKV Server v{}", arborkv::VERSION);

    let config = Config::builder()
        .listen_addr(format!("{}:{}", args.host, args.port))
        .max_batch_depth(args.max_batch_depth)
        .build();

    // The only SIGINT handler in the process; the monitor thread does the work
    let (interrupt_tx, interrupt_rx) = channel::unbounded();
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = interrupt_tx.send(());
    }) {
        tracing::error!("Failed to install interrupt handler: {}", e);
        std::process::exit(1);
    }

    let server = match Server::start(config, interrupt_rx) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(e) = server.run(stdin.lock(), stdout.lock()) {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
