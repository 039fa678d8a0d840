// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon shutdown and connection diagnostics for the CLI.

use std::path::PathBuf;

use crate::client::{timeout_exit, ClientError, DaemonClient};
use crate::daemon_process::{
    cleanup_stale_pid, daemon_dir, daemon_socket, force_kill_daemon, process_exists,
    read_daemon_pid, wait_for_exit,
};

/// Stop the daemon, gracefully first.
///
/// With `kill`, the daemon cancels every tracked execution before exiting.
/// Returns false if it wasn't running.
pub async fn daemon_stop(kill: bool) -> Result<bool, ClientError> {
    let client = match DaemonClient::connect() {
        Ok(c) => c,
        Err(ClientError::DaemonNotRunning) => {
            if let Ok(dir) = daemon_dir() {
                cleanup_stale_pid(&dir);
            }
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    let shutdown_result = client.shutdown(kill).await;

    if let Some(pid) = read_daemon_pid()? {
        if shutdown_result.is_ok() {
            wait_for_exit(pid, timeout_exit()).await;
        }
        if process_exists(pid) {
            force_kill_daemon(pid);
            wait_for_exit(pid, timeout_exit()).await;
        }
    }

    if let Ok(dir) = daemon_dir() {
        cleanup_stale_pid(&dir);
    }

    Ok(true)
}

/// Append a diagnostic line to `<state_dir>/cli.log`.
fn write_cli_log(message: String) {
    use std::io::Write;
    use std::time::SystemTime;

    let log_path = daemon_dir()
        .unwrap_or_else(|_| std::env::temp_dir().join("cg"))
        .join("cli.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    else {
        return;
    };
    let timestamp = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let cwd = std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "(unknown)".to_string());
    let state_dir = crate::env::state_dir_raw().unwrap_or_else(|| "(not set)".to_string());

    let _ = writeln!(
        file,
        "[ts={}] pid={} cwd={} CG_STATE_DIR={} {}",
        timestamp,
        std::process::id(),
        cwd,
        state_dir,
        message
    );
}

/// Record a failed daemon connection in `cli.log`.
///
/// The CLI is often driven by scripts whose stderr nobody reads.
pub fn log_connection_error(error: &ClientError) {
    let socket_path = daemon_socket()
        .map(|p: PathBuf| p.display().to_string())
        .unwrap_or_else(|_| "(unknown)".to_string());
    write_cli_log(format!("socket={} error={}", socket_path, error));
}
