//! ArborKV CLI Client
//!
//! Sends commands to an ArborKV server and prints each response.

use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;

use clap::Parser;

/// ArborKV CLI
#[derive(Parser, Debug)]
#[command(name = "arborkv-cli")]
#[command(about = "CLI for the ArborKV key-value server")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8888")]
    server: String,

    /// One command to send, e.g. `a alice 30`; reads stdin lines if omitted
    command: Vec<String>,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("arborkv-cli: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> io::Result<()> {
    let stream = TcpStream::connect(&args.server)?;
    let mut responses = BufReader::new(stream.try_clone()?);
    let mut requests = stream;

    if !args.command.is_empty() {
        return round_trip(&mut requests, &mut responses, &args.command.join(" "));
    }

    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        round_trip(&mut requests, &mut responses, &line)?;
    }
    Ok(())
}

fn round_trip(requests: &mut TcpStream, responses: &mut BufReader<TcpStream>, line: &str) -> io::Result<()> {
    writeln!(requests, "{}", line)?;

    let mut response = String::new();
    if responses.read_line(&mut response)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "server closed the connection",
        ));
    }
    print!("{}", response);
    Ok(())
}
