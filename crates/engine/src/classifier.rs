// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command classification: advisory `timeout` wrapping and the hard deadline.
//!
//! The advisory wrap lets the command's own tooling stop it cleanly (exit
//! code 124). The hard deadline is what the executor enforces no matter
//! what; it is always at least the configured ceiling, and sits a margin
//! above any advisory limit so it never pre-empts the wrapper.

use std::time::Duration;

use crate::compose::quote;
use crate::timeout_policy::{self, Intent};

/// Result of classifying one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Command to run, possibly wrapped in `timeout <secs>`
    pub command: String,
    /// Policy intent, when the table matched
    pub intent: Option<Intent>,
    /// Advisory limit: from the table, or parsed from the operator's own directive
    pub advisory: Option<Duration>,
    /// Authoritative wall-clock deadline for the executor
    pub deadline: Duration,
    /// Whether the command carries a timeout directive (ours or the operator's)
    pub has_timeout_directive: bool,
    /// Whether this classification added the wrapper
    pub wrapped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classifier {
    ceiling: Duration,
    margin: Duration,
}

impl Classifier {
    pub fn new(ceiling: Duration, margin: Duration) -> Self {
        Self { ceiling, margin }
    }

    /// Classify `raw`. Idempotent: classifying the returned command again
    /// yields the same command and deadline.
    pub fn classify(&self, raw: &str) -> Classification {
        let command = raw.trim();

        if has_timeout_directive(command) {
            let advisory = explicit_timeout(command);
            return Classification {
                command: command.to_string(),
                intent: None,
                advisory,
                deadline: self.deadline_for(advisory),
                has_timeout_directive: true,
                wrapped: false,
            };
        }

        match timeout_policy::lookup(command) {
            Some(entry) => {
                let advisory = Some(entry.limit());
                Classification {
                    command: wrap(command, entry.limit_secs),
                    intent: Some(entry.intent),
                    advisory,
                    deadline: self.deadline_for(advisory),
                    has_timeout_directive: true,
                    wrapped: true,
                }
            }
            None => Classification {
                command: command.to_string(),
                intent: None,
                advisory: None,
                deadline: self.ceiling,
                has_timeout_directive: false,
                wrapped: false,
            },
        }
    }

    fn deadline_for(&self, advisory: Option<Duration>) -> Duration {
        match advisory {
            Some(limit) => self.ceiling.max(limit.saturating_add(self.margin)),
            None => self.ceiling,
        }
    }
}

/// Wrap in `timeout`. Compound shell lines are wrapped as a whole through
/// `sh -c` so the limit covers every part, not just the first program.
fn wrap(command: &str, secs: u64) -> String {
    const SHELL_META: &[&str] = &["|", "&", ";", "<", ">", "`", "$("];
    if SHELL_META.iter().any(|m| command.contains(m)) {
        format!("timeout {secs} sh -c {}", quote(command))
    } else {
        format!("timeout {secs} {command}")
    }
}

/// A command already bounding its own run time: mentions `timeout`, uses
/// curl's `--max-time`, or carries an explicit count flag (`ping -c 3`).
pub fn has_timeout_directive(command: &str) -> bool {
    let lower = command.to_ascii_lowercase();
    lower.contains("timeout") || lower.contains("--max-time") || has_count_flag(command)
}

fn has_count_flag(command: &str) -> bool {
    let mut tokens = command.split_whitespace().peekable();
    while let Some(token) = tokens.next() {
        if token == "--count" || token.starts_with("--count=") {
            return true;
        }
        if token == "-c" {
            if tokens.peek().is_some_and(|next| is_number(next)) {
                return true;
            }
            continue;
        }
        if let Some(rest) = token.strip_prefix("-c") {
            if is_number(rest) {
                return true;
            }
        }
    }
    false
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Duration given to a `timeout` utility invocation inside `command`.
///
/// Understands `timeout [OPTIONS] DURATION ...` with coreutils suffixes.
fn explicit_timeout(command: &str) -> Option<Duration> {
    let mut tokens = command.split_whitespace();
    while let Some(token) = tokens.next() {
        if token != "timeout" {
            continue;
        }
        while let Some(arg) = tokens.next() {
            match arg {
                "-s" | "-k" | "--signal" | "--kill-after" => {
                    tokens.next();
                }
                a if a.starts_with('-') => {}
                a => return parse_timeout_duration(a),
            }
        }
    }
    None
}

fn parse_timeout_duration(s: &str) -> Option<Duration> {
    let (number, scale) = match s.char_indices().last()? {
        (i, 's') => (&s[..i], 1.0),
        (i, 'm') => (&s[..i], 60.0),
        (i, 'h') => (&s[..i], 3600.0),
        (i, 'd') => (&s[..i], 86_400.0),
        _ => (s, 1.0),
    };
    let value: f64 = number.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    // Finite but past Duration's range (`timeout 1e20 ...`) counts as unparsed
    Duration::try_from_secs_f64(value * scale).ok()
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
