// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn chunk(stream: StreamKind, text: &str) -> OutputChunk {
    OutputChunk {
        stream,
        bytes: text.as_bytes().to_vec(),
    }
}

#[test]
fn streams_are_kept_apart_and_in_order() {
    let mut buf = OutputBuffer::default();
    buf.push(chunk(StreamKind::Stdout, "a"));
    buf.push(chunk(StreamKind::Stderr, "x"));
    buf.push(chunk(StreamKind::Stdout, "b"));
    buf.push(chunk(StreamKind::Stderr, "y"));

    assert_eq!(buf.stdout(), "ab");
    assert_eq!(buf.stderr(), "xy");
    assert!(!buf.is_truncated());
}

#[test]
fn cap_truncates_and_marks() {
    let mut buf = OutputBuffer::with_limit(4);
    buf.push(chunk(StreamKind::Stdout, "abc"));
    buf.push(chunk(StreamKind::Stdout, "defg"));
    buf.push(chunk(StreamKind::Stdout, "more"));
    buf.push(chunk(StreamKind::Stderr, "ok"));

    assert_eq!(buf.stdout(), format!("abcd{TRUNCATION_MARKER}"));
    assert_eq!(buf.stderr(), "ok");
    assert!(buf.is_truncated());
}

#[test]
fn invalid_utf8_is_replaced() {
    let mut buf = OutputBuffer::default();
    buf.push(OutputChunk {
        stream: StreamKind::Stdout,
        bytes: vec![b'o', 0xff, b'k'],
    });
    assert_eq!(buf.stdout(), "o\u{fffd}k");
}
