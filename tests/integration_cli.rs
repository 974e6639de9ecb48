//! Integration tests for the `envsnap` binary.
//!
//! Fatal startup paths must exit before anything is served.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

fn envsnap(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_envsnap"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run envsnap")
}

// =============================================================================
// Startup failures
// =============================================================================

#[test]
fn empty_prefix_exits_with_failure() {
    let out = envsnap(&["-p", "", "-http", "127.0.0.1:0"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("prefix is required"));
}

#[test]
fn empty_address_exits_with_failure() {
    let out = envsnap(&["-http", ""]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("http address is required"));
}

#[test]
fn occupied_address_exits_with_failure() {
    let taken = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = taken.local_addr().unwrap().to_string();

    let out = envsnap(&["-http", &addr]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains(&format!("bind {addr}")));
}

#[test]
fn unknown_flag_is_a_usage_error() {
    let out = envsnap(&["--nope"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn help_lists_both_flags() {
    let out = envsnap(&["--help"]);
    assert!(out.status.success());
    let help = String::from_utf8_lossy(&out.stdout);
    assert!(help.contains("--prefix"));
    assert!(help.contains("--http"));
}

// =============================================================================
// Serve and interrupt
// =============================================================================

#[cfg(unix)]
#[test]
fn serves_snapshot_then_stops_on_interrupt() {
    let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let addr = format!("127.0.0.1:{port}");

    let child = Command::new(env!("CARGO_BIN_EXE_envsnap"))
        .args(["-p", "SNAPTEST_", "-http", &addr])
        .env("SNAPTEST_GREETING", "hello=world")
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    let mut stream = loop {
        match TcpStream::connect(&addr) {
            Ok(stream) => break stream,
            Err(_) if Instant::now() < deadline => std::thread::sleep(Duration::from_millis(50)),
            Err(e) => panic!("envsnap never started listening: {e}"),
        }
    };

    stream
        .write_all(b"GET / HTTP/1.1\r\nhost: test\r\naccept: text/plain\r\nconnection: close\r\n\r\n")
        .unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).unwrap();
    assert!(raw.starts_with("HTTP/1.1 200"));
    assert!(raw.ends_with("\r\n\r\nGREETING=hello=world\n"));

    let killed = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(killed.success());

    let out = child.wait_with_output().unwrap();
    assert!(out.status.success());
    let logs = String::from_utf8_lossy(&out.stdout);
    assert!(logs.contains("server started"));
    assert!(logs.contains("signal captured, stopping"));
    assert!(logs.contains("server stopped"));
}
