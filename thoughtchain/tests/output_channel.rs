//! Tests for the process-wide stdout redirection.
//!
//! These swap file descriptor 1 for the whole test process, so they run
//! serially and write through `std::io::stdout()` directly (libtest only
//! captures the `print!` family).
#![cfg(unix)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use serial_test::serial;
use thoughtchain::error::ChannelError;
use thoughtchain::stdio::OutputChannel;

/// Cloneable in-memory sink standing in for the real stdout.
#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn stray(bytes: &[u8]) {
    let mut out = io::stdout();
    out.write_all(bytes).unwrap();
    out.flush().unwrap();
}

#[test]
#[serial]
fn test_stray_output_is_filtered() {
    let capture = Capture::default();
    let channel = OutputChannel::install_with_sink(capture.clone()).unwrap();
    assert!(OutputChannel::is_installed());

    stray(b"Loading model weights...\n");
    stray(b"{\"jsonrpc\":\"2.0\",\"method\":\"notifications/message\"}\n");
    stray(b"warning: something\n");

    let stats = channel.uninstall().unwrap();
    assert!(!OutputChannel::is_installed());
    assert_eq!(stats.forwarded, 1);
    assert!(stats.discarded >= 2);
    assert_eq!(
        capture.contents(),
        "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/message\"}\n"
    );
}

#[test]
#[serial]
fn test_frame_writer_bypasses_fd1() {
    let capture = Capture::default();
    let channel = OutputChannel::install_with_sink(capture.clone()).unwrap();

    let mut writer = channel.frame_writer();
    writer
        .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}\n")
        .unwrap();
    writer.write_all(b"not a frame\n").unwrap();
    writer.flush().unwrap();

    channel.uninstall().unwrap();
    assert_eq!(
        capture.contents(),
        "{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":{}}\n"
    );
    assert_eq!(writer.stats().forwarded, 1);
    assert_eq!(writer.stats().discarded, 1);
}

#[test]
#[serial]
fn test_second_install_rejected() {
    let first = OutputChannel::install_with_sink(Capture::default()).unwrap();
    let second = OutputChannel::install_with_sink(Capture::default());
    assert!(matches!(second, Err(ChannelError::AlreadyInstalled)));
    drop(first);

    // Dropping restores and releases the singleton.
    let again = OutputChannel::install_with_sink(Capture::default()).unwrap();
    again.uninstall().unwrap();
}

#[test]
#[serial]
fn test_partial_frame_flushed_on_uninstall() {
    let capture = Capture::default();
    let channel = OutputChannel::install_with_sink(capture.clone()).unwrap();

    stray(b"{\"partial\":true}");

    channel.uninstall().unwrap();
    // The harness may append its own output to an unterminated line.
    assert!(capture.contents().starts_with("{\"partial\":true}"));
}
