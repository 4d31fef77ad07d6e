//! Tests for Engine
//!
//! These tests verify:
//! - Line execution and response mapping
//! - Batch files (silent execution, bad names, nesting limit, cancellation)
//! - Dumps to a sink and to a file

use std::fs;
use std::io::Write;

use arborkv::config::Config;
use arborkv::engine::Engine;
use arborkv::protocol::{Command, Response};
use arborkv::session::CancelToken;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_engine() -> Engine {
    Engine::new(Config::default())
}

fn run(engine: &Engine, line: &str) -> Response {
    engine.execute_line(line.as_bytes(), &CancelToken::new())
}

// =============================================================================
// Command Execution Tests
// =============================================================================

#[test]
fn test_engine_scenario() {
    let engine = setup_engine();

    assert_eq!(run(&engine, "a alice 30"), Response::Added);
    assert_eq!(run(&engine, "q alice"), Response::Value(b"30".to_vec()));
    assert_eq!(run(&engine, "a alice 31"), Response::AlreadyInDatabase);
    assert_eq!(run(&engine, "q alice"), Response::Value(b"30".to_vec()));
    assert_eq!(run(&engine, "d bob"), Response::NotInDatabase);
    assert_eq!(run(&engine, "d alice"), Response::Removed);
    assert_eq!(run(&engine, "q alice"), Response::NotFound);
}

#[test]
fn test_engine_ill_formed_lines() {
    let engine = setup_engine();

    for line in ["", "z", "a onlykey", "q", "hello world"] {
        assert_eq!(run(&engine, line), Response::IllFormed, "line {:?}", line);
    }
    assert!(engine.tree().is_empty());
}

#[test]
fn test_engine_rejects_oversized_entry_when_token_limit_allows_it() {
    let engine = Engine::new(Config::builder().max_token_len(1000).build());
    let value = "v".repeat(300);

    assert_eq!(run(&engine, &format!("a key {}", value)), Response::IllFormed);
    assert_eq!(run(&engine, "q key"), Response::NotFound);
}

#[test]
fn test_engine_execute_parsed_command() {
    let engine = setup_engine();
    let token = CancelToken::new();

    let add = Command::Add {
        key: b"k".to_vec(),
        value: b"v".to_vec(),
    };
    assert_eq!(engine.execute(add, &token), Response::Added);
    assert_eq!(
        engine.execute(Command::Query { key: b"k".to_vec() }, &token),
        Response::Value(b"v".to_vec())
    );
}

// =============================================================================
// Batch File Tests
// =============================================================================

#[test]
fn test_engine_batch_file() {
    let engine = setup_engine();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("commands.txt");
    fs::write(&path, "a alice 30\na bob 40\nd alice\nnonsense\nq bob\n").unwrap();

    let response = run(&engine, &format!("f {}", path.display()));

    assert_eq!(response, Response::FileProcessed);
    assert_eq!(run(&engine, "q alice"), Response::NotFound);
    assert_eq!(run(&engine, "q bob"), Response::Value(b"40".to_vec()));
}

#[test]
fn test_engine_batch_last_line_without_newline() {
    let engine = setup_engine();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("commands.txt");
    fs::write(&path, "a first 1\na last 2").unwrap();

    assert_eq!(run(&engine, &format!("f {}", path.display())), Response::FileProcessed);
    assert_eq!(run(&engine, "q last"), Response::Value(b"2".to_vec()));
}

#[test]
fn test_engine_batch_bad_file_name() {
    let engine = setup_engine();
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.txt");

    assert_eq!(run(&engine, &format!("f {}", missing.display())), Response::BadFileName);
}

#[test]
fn test_engine_batch_self_reference_stops_at_depth_limit() {
    let engine = Engine::new(Config::builder().max_batch_depth(4).build());
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("loop.txt");
    fs::write(&path, format!("a k v\nf {}\n", path.display())).unwrap();

    assert_eq!(run(&engine, &format!("f {}", path.display())), Response::FileProcessed);
    assert_eq!(run(&engine, "q k"), Response::Value(b"v".to_vec()));
    assert_eq!(engine.tree().len(), 1);
}

#[test]
fn test_engine_batch_stops_when_cancelled() {
    let engine = setup_engine();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("commands.txt");
    fs::write(&path, "a k v\n").unwrap();

    let token = CancelToken::new();
    token.cancel();
    let line = format!("f {}", path.display());

    assert_eq!(engine.execute_line(line.as_bytes(), &token), Response::FileProcessed);
    assert_eq!(run(&engine, "q k"), Response::NotFound);
}

// =============================================================================
// Dump Tests
// =============================================================================

#[test]
fn test_engine_dump_to_sink() {
    let engine = setup_engine();
    run(&engine, "a m 1");

    let mut out = Vec::new();
    engine.dump_to(&mut out).unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "(root)\n (null)\n m 1\n  (null)\n  (null)\n"
    );
}

#[test]
fn test_engine_dump_to_file_overwrites() {
    let engine = setup_engine();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dump.txt");
    {
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(&vec![b'#'; 4096]).unwrap();
    }

    run(&engine, "a m 1");
    engine.dump_to_file(&path).unwrap();

    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "(root)\n (null)\n m 1\n  (null)\n  (null)\n"
    );
}

#[test]
fn test_engine_dump_to_unwritable_path_fails() {
    let engine = setup_engine();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no-such-dir").join("dump.txt");

    assert!(engine.dump_to_file(&path).is_err());
}

#[test]
fn test_engine_teardown_frees_everything() {
    let engine = setup_engine();
    for i in 0..10 {
        run(&engine, &format!("a key{} v", i));
    }

    assert_eq!(engine.teardown(), 10);
    assert!(engine.tree().is_empty());
}
