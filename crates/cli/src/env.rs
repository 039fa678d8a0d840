// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::client::ClientError;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|s| !s.is_empty())
}

// --- State directory ---

/// Resolve state directory: CG_STATE_DIR > XDG_STATE_HOME/cg > ~/.local/state/cg
pub fn state_dir() -> Result<PathBuf, ClientError> {
    if let Ok(dir) = std::env::var("CG_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("cg"));
    }
    let home = std::env::var("HOME").map_err(|_| ClientError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/cg"))
}

/// Read CG_STATE_DIR raw (for diagnostic logging)
pub fn state_dir_raw() -> Option<String> {
    std::env::var("CG_STATE_DIR").ok()
}

// --- Daemon binary ---

pub fn daemon_binary() -> Option<String> {
    std::env::var("CG_DAEMON_BINARY").ok()
}

pub fn cargo_manifest_dir() -> Option<String> {
    std::env::var("CARGO_MANIFEST_DIR").ok()
}

// --- Forwarded cloud credentials ---

pub fn aws_access_key_id() -> Option<String> {
    non_empty("AWS_ACCESS_KEY_ID")
}
pub fn aws_secret_access_key() -> Option<String> {
    non_empty("AWS_SECRET_ACCESS_KEY")
}
pub fn aws_session_token() -> Option<String> {
    non_empty("AWS_SESSION_TOKEN")
}

// --- Timeouts ---

pub fn timeout_ipc_ms() -> Option<Duration> {
    parse_duration_ms("CG_TIMEOUT_IPC_MS")
}
pub fn timeout_exec_ms() -> Option<Duration> {
    parse_duration_ms("CG_TIMEOUT_EXEC_MS")
}
pub fn timeout_connect_ms() -> Option<Duration> {
    parse_duration_ms("CG_TIMEOUT_CONNECT_MS")
}
pub fn timeout_exit_ms() -> Option<Duration> {
    parse_duration_ms("CG_TIMEOUT_EXIT_MS")
}
pub fn connect_poll_ms() -> Option<Duration> {
    parse_duration_ms("CG_CONNECT_POLL_MS")
}
