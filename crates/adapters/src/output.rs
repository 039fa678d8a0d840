// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Captured process output

/// Per-stream capture cap
pub const DEFAULT_STREAM_LIMIT: usize = 4 * 1024 * 1024;

/// Appended once a stream hits its cap
pub const TRUNCATION_MARKER: &str = "\n[output truncated]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// A piece of output as read from one pipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub stream: StreamKind,
    pub bytes: Vec<u8>,
}

/// Accumulates stdout and stderr separately, each capped at `limit` bytes.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    limit: usize,
    stdout_truncated: bool,
    stderr_truncated: bool,
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::with_limit(DEFAULT_STREAM_LIMIT)
    }
}

impl OutputBuffer {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            limit,
            stdout_truncated: false,
            stderr_truncated: false,
        }
    }

    pub fn push(&mut self, chunk: OutputChunk) {
        let (buf, truncated) = match chunk.stream {
            StreamKind::Stdout => (&mut self.stdout, &mut self.stdout_truncated),
            StreamKind::Stderr => (&mut self.stderr, &mut self.stderr_truncated),
        };
        let room = self.limit.saturating_sub(buf.len());
        if chunk.bytes.len() > room {
            buf.extend_from_slice(&chunk.bytes[..room]);
            *truncated = true;
        } else {
            buf.extend_from_slice(&chunk.bytes);
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.stdout_truncated || self.stderr_truncated
    }

    /// Stdout decoded lossily, with the truncation marker if capped
    pub fn stdout(&self) -> String {
        render(&self.stdout, self.stdout_truncated)
    }

    pub fn stderr(&self) -> String {
        render(&self.stderr, self.stderr_truncated)
    }
}

fn render(bytes: &[u8], truncated: bool) -> String {
    let mut text = String::from_utf8_lossy(bytes).into_owned();
    if truncated {
        text.push_str(TRUNCATION_MARKER);
    }
    text
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
