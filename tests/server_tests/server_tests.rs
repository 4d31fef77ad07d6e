//! Server Tests
//!
//! End-to-end over TCP:
//! - Line protocol round trips
//! - Admin console commands
//! - Interrupt, then reconnect
//! - End of admin input shuts the server down

use std::io::{self, BufRead, BufReader, Cursor, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::Duration;

use arborkv::admin::{AdminCommand, AdminConsole};
use arborkv::config::Config;
use arborkv::context::ServerContext;
use arborkv::shutdown::Phase;
use arborkv::Server;
use crossbeam::channel::{self, Receiver, Sender};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn test_config() -> Config {
    Config::builder()
        .listen_addr("127.0.0.1:0")
        .accept_poll_interval_ms(10)
        .build()
}

fn start_server() -> (Server, Sender<()>) {
    let (interrupt_tx, interrupt_rx) = channel::unbounded();
    let server = Server::start(test_config(), interrupt_rx).unwrap();
    (server, interrupt_tx)
}

struct TcpClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl TcpClient {
    fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        Self {
            reader: BufReader::new(stream.try_clone().unwrap()),
            writer: stream,
        }
    }

    fn request(&mut self, line: &str) -> String {
        writeln!(self.writer, "{}", line).unwrap();
        let mut response = String::new();
        self.reader.read_line(&mut response).unwrap();
        response.trim_end().to_string()
    }

    /// True once the server has closed the connection
    fn is_closed(&mut self) -> bool {
        let mut buf = String::new();
        match self.reader.read_line(&mut buf) {
            Ok(n) => n == 0,
            Err(e) => matches!(
                e.kind(),
                io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted
            ),
        }
    }
}

/// Admin input fed line by line; dropping the sender is end of input
struct ChannelReader {
    lines: Receiver<String>,
    current: Cursor<Vec<u8>>,
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let read = self.current.read(buf)?;
            if read > 0 || buf.is_empty() {
                return Ok(read);
            }
            match self.lines.recv() {
                Ok(line) => self.current = Cursor::new(line.into_bytes()),
                Err(_) => return Ok(0),
            }
        }
    }
}

/// Output sink whose every write fails
struct BrokenWriter;

impl Write for BrokenWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "console gone"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "console gone"))
    }
}

/// Admin input that fails on the first read
struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "stdin gone"))
    }
}

// =============================================================================
// Protocol Tests
// =============================================================================

#[test]
fn test_tcp_scenario() {
    let (server, _interrupts) = start_server();
    let mut client = TcpClient::connect(server.local_addr());

    assert_eq!(client.request("a alice 30"), "added");
    assert_eq!(client.request("q alice"), "30");
    assert_eq!(client.request("a alice 31"), "already in database");
    assert_eq!(client.request("q alice"), "30");
    assert_eq!(client.request("d bob"), "not in database");
    assert_eq!(client.request("d alice"), "removed");
    assert_eq!(client.request("q alice"), "not found");
    assert_eq!(client.request("x"), "ill-formed command");
    assert_eq!(client.request("f /definitely/not/here"), "bad file name");

    server.shutdown();
    assert!(client.is_closed());
}

#[test]
fn test_tcp_many_clients() {
    let (server, _interrupts) = start_server();
    let addr = server.local_addr();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            thread::spawn(move || {
                let mut client = TcpClient::connect(addr);
                for i in 0..25 {
                    assert_eq!(client.request(&format!("a t{}-{} v{}", t, i, i)), "added");
                }
                assert_eq!(client.request(&format!("q t{}-7", t)), "v7");
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(server.context().engine().tree().len(), 200);
    assert_eq!(server.shutdown(), 200);
}

// =============================================================================
// Interrupt Tests
// =============================================================================

#[test]
fn test_interrupt_drops_clients_and_server_keeps_accepting() {
    let (server, interrupts) = start_server();
    let mut client = TcpClient::connect(server.local_addr());
    assert_eq!(client.request("a k v"), "added");

    interrupts.send(()).unwrap();
    assert!(client.is_closed());

    let mut again = TcpClient::connect(server.local_addr());
    assert_eq!(again.request("q k"), "v");
    assert_eq!(server.context().coordinator().phase(), Phase::Accepting);

    server.shutdown();
}

// =============================================================================
// Admin Console Tests
// =============================================================================

#[test]
fn test_admin_command_parse() {
    assert_eq!(AdminCommand::parse("s\n"), Some(AdminCommand::Stop));
    assert_eq!(AdminCommand::parse("g"), Some(AdminCommand::Go));
    assert_eq!(AdminCommand::parse("p"), Some(AdminCommand::Print(None)));
    assert_eq!(
        AdminCommand::parse("p   out.txt \n"),
        Some(AdminCommand::Print(Some("out.txt".into())))
    );
    assert_eq!(AdminCommand::parse(""), None);
    assert_eq!(AdminCommand::parse("stop"), None);
}

#[test]
fn test_admin_console_stop_go_and_print() {
    let ctx = ServerContext::new(Config::default());
    ctx.engine().tree().insert(b"m", b"1").unwrap();

    let mut out = Vec::new();
    AdminConsole::new(&ctx, &mut out)
        .run(Cursor::new("s\n\nwhat\ng\np\n"))
        .unwrap();

    assert!(ctx.gate().is_running());
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "All clients stopped\nunknown command\nAll clients resumed\n(root)\n (null)\n m 1\n  (null)\n  (null)\n"
    );
}

#[test]
fn test_admin_console_print_to_file() {
    let ctx = ServerContext::new(Config::default());
    ctx.engine().tree().insert(b"m", b"1").unwrap();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dump.txt");
    let bad = dir.path().join("missing").join("dump.txt");

    let mut out = Vec::new();
    let input = format!("p {}\np {}\n", path.display(), bad.display());
    AdminConsole::new(&ctx, &mut out).run(Cursor::new(input)).unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "(root)\n (null)\n m 1\n  (null)\n  (null)\n"
    );
    assert_eq!(
        String::from_utf8(out).unwrap(),
        format!("could not write {}\n", bad.display())
    );
}

// =============================================================================
// Shutdown Tests
// =============================================================================

#[test]
fn test_end_of_admin_input_shuts_down() {
    let (server, _interrupts) = start_server();
    let addr = server.local_addr();
    let ctx = std::sync::Arc::clone(server.context());

    let mut client = TcpClient::connect(addr);
    assert_eq!(client.request("a a 1"), "added");
    assert_eq!(client.request("a b 2"), "added");

    let (admin_tx, admin_rx) = channel::unbounded();
    let input = BufReader::new(ChannelReader {
        lines: admin_rx,
        current: Cursor::new(Vec::new()),
    });
    let runner = thread::spawn(move || server.run(input, io::sink()).unwrap());

    admin_tx.send("s\n".to_string()).unwrap();
    admin_tx.send("g\n".to_string()).unwrap();
    assert_eq!(client.request("q a"), "1");

    drop(admin_tx);
    assert_eq!(runner.join().unwrap(), 2);

    assert!(client.is_closed());
    assert_eq!(ctx.coordinator().phase(), Phase::Closed);
    assert_eq!(ctx.coordinator().live_sessions(), 0);
    assert!(ctx.registry().is_empty());

    // Nothing is served after shutdown
    match TcpStream::connect(addr) {
        Err(_) => {}
        Ok(stream) => {
            stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
            let mut late = TcpClient {
                reader: BufReader::new(stream.try_clone().unwrap()),
                writer: stream,
            };
            let _ = writeln!(late.writer, "q a");
            assert!(late.is_closed());
        }
    }
}

#[test]
fn test_non_utf8_admin_line_is_reported_and_shutdown_runs() {
    let (server, _interrupts) = start_server();
    let ctx = std::sync::Arc::clone(server.context());
    ctx.engine().tree().insert(b"k", b"v").unwrap();

    let mut out = Vec::new();
    let freed = server
        .run(Cursor::new(b"s\n\xff\xfe\ng\n".to_vec()), &mut out)
        .unwrap();

    assert_eq!(freed, 1);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "All clients stopped\nunknown command\nAll clients resumed\n"
    );
    assert_eq!(ctx.coordinator().phase(), Phase::Closed);
    assert!(ctx.engine().tree().is_empty());
}

#[test]
fn test_failed_console_output_still_shuts_down() {
    let (server, _interrupts) = start_server();
    let ctx = std::sync::Arc::clone(server.context());
    ctx.engine().tree().insert(b"k", b"v").unwrap();

    let freed = server.run(Cursor::new("p\ns\ng\n"), BrokenWriter).unwrap();

    assert_eq!(freed, 1);
    assert!(ctx.gate().is_running());
    assert_eq!(ctx.coordinator().phase(), Phase::Closed);
}

#[test]
fn test_failed_admin_read_still_shuts_down() {
    let (server, _interrupts) = start_server();
    let ctx = std::sync::Arc::clone(server.context());
    let mut client = TcpClient::connect(server.local_addr());
    assert_eq!(client.request("a k v"), "added");

    let result = server.run(BufReader::new(FailingReader), io::sink());

    assert!(result.is_err());
    assert!(client.is_closed());
    assert_eq!(ctx.coordinator().phase(), Phase::Closed);
    assert_eq!(ctx.coordinator().live_sessions(), 0);
    assert!(ctx.engine().tree().is_empty());
}
