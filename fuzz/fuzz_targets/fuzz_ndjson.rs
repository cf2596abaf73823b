#![no_main]

//! Fuzz target for NDJSON parsing and the stdout frame filter.
//!
//! # Goal
//! Verify that arbitrary input lines never:
//! - Panic the parser
//! - Let a non-frame line through the filter
//! - Alter a forwarded frame

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::io::Write;

use thoughtchain::stdio::{FrameFilter, is_protocol_frame, parse_stdio_message};

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// Raw bytes written to stdout.
    raw: Vec<u8>,
    /// Write sizes used to chop `raw`.
    cuts: Vec<u8>,
}

fuzz_target!(|input: FuzzInput| {
    if let Ok(text) = std::str::from_utf8(&input.raw) {
        for line in text.split('\n') {
            let _ = parse_stdio_message(line);
        }
    }

    let mut filter = FrameFilter::new(Vec::new());
    let mut rest = input.raw.as_slice();
    for cut in input.cuts {
        let n = usize::from(cut).min(rest.len());
        let _ = filter.write_all(&rest[..n]);
        rest = &rest[n..];
    }
    let _ = filter.write_all(rest);
    let _ = filter.flush();
    let output = filter.into_inner();

    let expected: Vec<u8> = input
        .raw
        .split_inclusive(|&b| b == b'\n')
        .filter(|line| is_protocol_frame(line))
        .flatten()
        .copied()
        .collect();
    assert_eq!(output, expected);
});
