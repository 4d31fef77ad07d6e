//! Connection Handler
//!
//! Line I/O over a single client TCP stream.

use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::net::{Shutdown, TcpStream};

use crate::error::Result;
use crate::protocol::Response;
use crate::session::Interrupter;

use super::Transport;

/// Longest request line read in one piece; the rest arrives as the next line
pub const MAX_LINE_LEN: u64 = 1024;

/// A client connection speaking the line protocol
pub struct TcpConnection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Peer address for logging
    peer_addr: String,
}

impl TcpConnection {
    /// Wrap an accepted stream
    pub fn new(stream: TcpStream) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            peer_addr,
        })
    }
}

impl Transport for TcpConnection {
    fn read_command(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        let read = (&mut self.reader).take(MAX_LINE_LEN).read_until(b'\n', &mut line);

        match read {
            Ok(0) => Ok(None),
            Ok(_) => {
                while matches!(line.last(), Some(b'\n' | b'\r')) {
                    line.pop();
                }
                Ok(Some(line))
            }
            // Peer went away: a normal end of stream for the session
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::ConnectionReset
                        | io::ErrorKind::ConnectionAborted
                        | io::ErrorKind::UnexpectedEof
                ) =>
            {
                tracing::debug!("Connection from {} closed: {}", self.peer_addr, e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn write_response(&mut self, response: &Response) -> io::Result<()> {
        self.writer.write_all(response.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    fn interrupter(&self) -> io::Result<Interrupter> {
        let stream = self.writer.get_ref().try_clone()?;
        Ok(Box::new(move || {
            // Fails only if the socket is already closed
            let _ = stream.shutdown(Shutdown::Both);
        }))
    }

    fn peer(&self) -> String {
        self.peer_addr.clone()
    }
}
