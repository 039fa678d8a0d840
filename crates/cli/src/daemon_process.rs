// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Starting, stopping and locating the `cgd` process.

use crate::client::ClientError;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Start the daemon in the background, returning the child process handle
pub fn start_daemon_background() -> Result<std::process::Child, ClientError> {
    let cgd_path = find_cgd_binary();

    Command::new(&cgd_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(format!("{}: {}", cgd_path.display(), e)))
}

/// Stop the daemon synchronously with SIGTERM, then SIGKILL.
///
/// Used by the version-mismatch restart, which runs before any request.
pub fn stop_daemon_sync() {
    if let Ok(Some(pid)) = read_daemon_pid() {
        kill_signal("-15", pid);
        let timeout = crate::client::timeout_exit();
        if !wait_for_exit_sync(pid, timeout) {
            force_kill_daemon(pid);
            wait_for_exit_sync(pid, timeout);
        }
    }

    if let Ok(dir) = daemon_dir() {
        cleanup_stale_pid(&dir);
    }
}

fn wait_for_exit_sync(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !process_exists(pid) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    !process_exists(pid)
}

/// Wait for a process to exit
pub async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !process_exists(pid) {
            return true;
        }
        tokio::time::sleep(crate::client::poll_interval()).await;
    }
    false
}

/// Locate `cgd`: CG_DAEMON_BINARY, the dev build, a sibling of `cg`, then PATH.
pub fn find_cgd_binary() -> PathBuf {
    if let Some(path) = crate::env::daemon_binary() {
        return PathBuf::from(path);
    }

    let current_exe = std::env::current_exe().ok();

    // A release `cg` must not pick up a debug `cgd` through an inherited env
    let is_debug_build = current_exe
        .as_ref()
        .and_then(|p| p.to_str())
        .is_some_and(|s| s.contains("target/debug"));

    if is_debug_build {
        let dev_path = crate::env::cargo_manifest_dir().and_then(|dir| {
            PathBuf::from(dir)
                .parent()
                .and_then(|p| p.parent())
                .map(|p| p.join("target/debug/cgd"))
        });
        if let Some(path) = dev_path.filter(|p| p.exists()) {
            return path;
        }
    }

    if let Some(dir) = current_exe.as_deref().and_then(Path::parent) {
        let sibling = dir.join("cgd");
        if sibling.exists() {
            return sibling;
        }
    }

    PathBuf::from("cgd")
}

/// Get the socket path for the user-level daemon.
pub fn daemon_socket() -> Result<PathBuf, ClientError> {
    Ok(daemon_dir()?.join("daemon.sock"))
}

pub fn daemon_dir() -> Result<PathBuf, ClientError> {
    crate::env::state_dir()
}

pub fn daemon_log() -> Result<PathBuf, ClientError> {
    Ok(daemon_dir()?.join("daemon.log"))
}

/// Clean up orphaned PID file during shutdown.
pub fn cleanup_stale_pid(dir: &Path) {
    let pid_path = dir.join("daemon.pid");
    if pid_path.exists() {
        let _ = std::fs::remove_file(&pid_path);
    }
}

/// Get the PID from the daemon PID file, if it exists
pub fn read_daemon_pid() -> Result<Option<u32>, ClientError> {
    let pid_path = daemon_dir()?.join("daemon.pid");
    match std::fs::read_to_string(&pid_path) {
        Ok(content) => Ok(content.trim().parse::<u32>().ok()),
        Err(_) => Ok(None),
    }
}

fn kill_signal(signal: &str, pid: u32) -> bool {
    Command::new("kill")
        .args([signal, &pid.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn process_exists(pid: u32) -> bool {
    kill_signal("-0", pid)
}

pub fn force_kill_daemon(pid: u32) -> bool {
    kill_signal("-9", pid)
}

/// Written by `cgd` before anything else on each start.
const STARTUP_MARKER_PREFIX: &str = "--- cgd: starting (pid: ";

/// Errors logged by the most recent startup attempt.
pub fn read_startup_error() -> Option<String> {
    let content = std::fs::read_to_string(daemon_log().ok()?).ok()?;
    parse_startup_error(&content)
}

fn parse_startup_error(content: &str) -> Option<String> {
    let start_pos = content.rfind(STARTUP_MARKER_PREFIX)?;

    let errors: Vec<&str> = content[start_pos..]
        .lines()
        .filter(|line| line.contains(" ERROR ") || line.contains("Failed to start"))
        .collect();
    if errors.is_empty() {
        return None;
    }

    let messages: Vec<&str> = errors
        .iter()
        .filter_map(|line| line.split_once(": ").map(|(_, msg)| msg))
        .collect();
    if messages.is_empty() {
        Some(errors.join("\n"))
    } else {
        Some(messages.join("\n"))
    }
}

/// Replace `err` with the logged startup error, if there is one.
pub fn wrap_with_startup_error(err: ClientError) -> ClientError {
    if matches!(err, ClientError::DaemonStartFailed(_)) {
        return err;
    }
    match read_startup_error() {
        Some(startup_error) => ClientError::DaemonStartFailed(startup_error),
        None => err,
    }
}

/// Probe whether a Unix socket is accepting connections.
pub fn probe_socket(socket_path: &Path) -> bool {
    std::os::unix::net::UnixStream::connect(socket_path).is_ok()
}

/// Remove a socket file nobody is serving.
///
/// Keeps the files when the PID file names a live process, which may be a
/// daemon still binding its socket.
pub fn cleanup_stale_socket() -> Result<(), ClientError> {
    let dir = daemon_dir()?;
    let socket_path = dir.join("daemon.sock");
    let pid_path = dir.join("daemon.pid");

    let owner_alive = matches!(read_daemon_pid()?, Some(pid) if process_exists(pid));
    if !owner_alive {
        let _ = std::fs::remove_file(&socket_path);
        let _ = std::fs::remove_file(&pid_path);
    }
    Ok(())
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;
