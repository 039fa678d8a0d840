// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advisory time limits by command shape.
//!
//! An ordered, static table. Each entry names a command prefix (matched
//! token-wise, case-insensitive) and optionally a set of flags of which at
//! least one must also be present. The first matching entry wins.

use serde::Serialize;
use std::time::Duration;

/// Why a command gets an advisory limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    NetworkProbe,
    InteractiveMonitor,
    Streaming,
    Transfer,
    ClusterWatch,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Intent::NetworkProbe => "network_probe",
            Intent::InteractiveMonitor => "interactive_monitor",
            Intent::Streaming => "streaming",
            Intent::Transfer => "transfer",
            Intent::ClusterWatch => "cluster_watch",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyEntry {
    pub intent: Intent,
    /// Leading tokens the command must start with
    pub prefix: &'static [&'static str],
    /// When non-empty, one of these tokens must appear after the prefix
    pub flags: &'static [&'static str],
    pub limit_secs: u64,
}

impl PolicyEntry {
    pub fn limit(&self) -> Duration {
        Duration::from_secs(self.limit_secs)
    }

    fn matches(&self, tokens: &[String]) -> bool {
        if tokens.len() < self.prefix.len() {
            return false;
        }
        let head_matches = self
            .prefix
            .iter()
            .zip(tokens)
            .all(|(want, have)| *want == have.as_str());
        if !head_matches {
            return false;
        }
        self.flags.is_empty()
            || tokens[self.prefix.len()..]
                .iter()
                .any(|t| self.flags.iter().any(|f| flag_matches(f, t)))
    }
}

/// `--follow` also matches `--follow=true`
fn flag_matches(flag: &str, token: &str) -> bool {
    token == flag
        || (flag.starts_with("--")
            && token
                .strip_prefix(flag)
                .is_some_and(|rest| rest.starts_with('=')))
}

const FOLLOW: &[&str] = &["-f", "--follow"];
const WATCH: &[&str] = &["-w", "--watch", "--watch-only"];

macro_rules! entry {
    ($intent:ident, [$($p:literal),+], $flags:expr, $secs:literal) => {
        PolicyEntry {
            intent: Intent::$intent,
            prefix: &[$($p),+],
            flags: $flags,
            limit_secs: $secs,
        }
    };
}

/// Ordered policy. More specific prefixes come before general ones.
pub static POLICY_TABLE: &[PolicyEntry] = &[
    // Network probes
    entry!(NetworkProbe, ["ping"], &[], 5),
    entry!(NetworkProbe, ["ping6"], &[], 5),
    entry!(NetworkProbe, ["dig"], &[], 5),
    entry!(NetworkProbe, ["nslookup"], &[], 5),
    entry!(NetworkProbe, ["host"], &[], 5),
    entry!(NetworkProbe, ["nc"], &[], 5),
    entry!(NetworkProbe, ["telnet"], &[], 5),
    entry!(NetworkProbe, ["curl"], &[], 10),
    entry!(NetworkProbe, ["wget"], &[], 10),
    entry!(NetworkProbe, ["traceroute"], &[], 10),
    entry!(NetworkProbe, ["mtr"], &[], 10),
    // Interactive monitors
    entry!(InteractiveMonitor, ["top"], &[], 15),
    entry!(InteractiveMonitor, ["htop"], &[], 15),
    entry!(InteractiveMonitor, ["watch"], &[], 15),
    entry!(InteractiveMonitor, ["vmstat"], &[], 15),
    entry!(InteractiveMonitor, ["iostat"], &[], 15),
    entry!(InteractiveMonitor, ["kubectl", "top"], &[], 15),
    // Streaming / follow
    entry!(Streaming, ["tail"], FOLLOW, 15),
    entry!(Streaming, ["journalctl"], FOLLOW, 15),
    entry!(Streaming, ["kubectl", "logs"], FOLLOW, 20),
    entry!(Streaming, ["docker", "logs"], FOLLOW, 20),
    entry!(Streaming, ["aws", "logs", "tail"], &["--follow"], 20),
    // Transfers and bulk copies
    entry!(Transfer, ["aws", "s3", "cp"], &[], 120),
    entry!(Transfer, ["aws", "s3", "sync"], &[], 120),
    entry!(Transfer, ["aws", "s3", "mv"], &[], 120),
    entry!(Transfer, ["scp"], &[], 60),
    entry!(Transfer, ["rsync"], &[], 60),
    entry!(Transfer, ["docker", "pull"], &[], 60),
    entry!(Transfer, ["docker", "push"], &[], 60),
    entry!(Transfer, ["kubectl", "cp"], &[], 60),
    entry!(Transfer, ["kubectl", "rollout", "status"], &[], 20),
    // Cluster watches
    entry!(ClusterWatch, ["kubectl", "get"], WATCH, 15),
    entry!(ClusterWatch, ["kubectl", "port-forward"], &[], 15),
    entry!(ClusterWatch, ["kubectl", "attach"], &[], 15),
];

/// Split a command into lowercased tokens, dropping a leading `sudo`.
pub(crate) fn tokens(command: &str) -> Vec<String> {
    let mut tokens: Vec<String> = command
        .split_whitespace()
        .map(|t| t.to_ascii_lowercase())
        .collect();
    if tokens.first().is_some_and(|t| t == "sudo") {
        tokens.remove(0);
    }
    // Tolerate a path-qualified program, e.g. /usr/bin/ping
    if let Some(first) = tokens.first_mut() {
        if let Some((_, name)) = first.rsplit_once('/') {
            *first = name.to_string();
        }
    }
    strip_scope_flags(tokens)
}

/// Drop namespace scoping flags so `kubectl -n ns logs -f` still matches
/// the `kubectl logs` entry. Other programs keep their flags (`ping -n`).
fn strip_scope_flags(tokens: Vec<String>) -> Vec<String> {
    if tokens.first().map(String::as_str) != Some("kubectl") {
        return tokens;
    }
    let mut out = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter();
    while let Some(token) = iter.next() {
        match token.as_str() {
            "-n" | "--namespace" => {
                iter.next();
            }
            "-a" | "--all-namespaces" => {}
            t if t.starts_with("--namespace=") => {}
            _ => out.push(token),
        }
    }
    out
}

/// First policy entry matching `command`
pub fn lookup(command: &str) -> Option<&'static PolicyEntry> {
    let tokens = tokens(command);
    POLICY_TABLE.iter().find(|e| e.matches(&tokens))
}

#[cfg(test)]
#[path = "timeout_policy_tests.rs"]
mod tests;
