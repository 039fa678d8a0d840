// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use cg_core::{
    CancelReport, ExecuteReport, ExecuteRequest, ProbeReport, ProbeRequest, ProcessId,
    ProcessSummary, SessionSummary,
};
use cg_daemon::protocol::{self, ProtocolError};
use cg_daemon::{Request, Response, PROTOCOL_VERSION};
use thiserror::Error;
use tokio::net::UnixStream;

use crate::client_lifecycle::log_connection_error;
use crate::daemon_process::{
    cleanup_stale_socket, daemon_dir, daemon_socket, probe_socket, read_startup_error,
    start_daemon_background, stop_daemon_sync, wrap_with_startup_error,
};

/// Timeout for short IPC requests (hello, status, listings, shutdown)
pub fn timeout_ipc() -> Duration {
    crate::env::timeout_ipc_ms().unwrap_or(Duration::from_secs(5))
}

/// Timeout for requests that run a command (execute, probe, cancel)
pub fn timeout_exec() -> Duration {
    crate::env::timeout_exec_ms().unwrap_or(Duration::from_secs(600))
}

/// Timeout for waiting for daemon to start
pub fn timeout_connect() -> Duration {
    crate::env::timeout_connect_ms().unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for process to exit
pub fn timeout_exit() -> Duration {
    crate::env::timeout_exit_ms().unwrap_or(Duration::from_secs(2))
}

/// Polling interval for connection retries
pub fn poll_interval() -> Duration {
    crate::env::connect_poll_ms().unwrap_or(Duration::from_millis(50))
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running")]
    DaemonNotRunning,

    #[error("Failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("Connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not determine state directory")]
    NoStateDir,
}

impl ClientError {
    /// The socket file exists but nothing is listening behind it
    pub fn is_not_running(&self) -> bool {
        match self {
            ClientError::DaemonNotRunning => true,
            ClientError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionRefused | std::io::ErrorKind::NotFound
            ),
            _ => false,
        }
    }
}

/// Status snapshot reported by the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaemonStatus {
    pub uptime_secs: u64,
    pub sessions_active: usize,
    pub processes_active: usize,
}

pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// For commands that run something: auto-start with version check,
    /// at most one restart per CLI process.
    pub fn for_action() -> Result<Self, ClientError> {
        Self::connect_or_start_once()
    }

    /// For listings: connect only. An outdated daemon still answers these.
    pub fn for_query() -> Result<Self, ClientError> {
        Self::connect()
    }

    fn connect_or_start_once() -> Result<Self, ClientError> {
        static RESTARTED: AtomicBool = AtomicBool::new(false);

        if RESTARTED.load(Ordering::SeqCst) {
            return Self::connect();
        }
        if Self::daemon_outdated()? {
            RESTARTED.store(true, Ordering::SeqCst);
            stop_daemon_sync();
        }
        Self::connect_or_spawn()
    }

    /// Connect to daemon, auto-starting if not running
    pub fn connect_or_start() -> Result<Self, ClientError> {
        if Self::daemon_outdated()? {
            stop_daemon_sync();
        }
        Self::connect_or_spawn()
    }

    /// Compare `daemon.version` with this build, warning on mismatch
    fn daemon_outdated() -> Result<bool, ClientError> {
        let version_path = daemon_dir()?.join("daemon.version");
        let Ok(daemon_version) = std::fs::read_to_string(&version_path) else {
            return Ok(false);
        };
        if daemon_version.trim() == PROTOCOL_VERSION {
            return Ok(false);
        }
        eprintln!(
            "warn: daemon version {} does not match cli version {}, restarting daemon",
            daemon_version.trim(),
            PROTOCOL_VERSION
        );
        Ok(true)
    }

    fn connect_or_spawn() -> Result<Self, ClientError> {
        match Self::connect() {
            Ok(client) => {
                // A crashed daemon leaves its socket file behind
                if probe_socket(&client.socket_path) {
                    Ok(client)
                } else {
                    cleanup_stale_socket()?;
                    let child = start_daemon_background()?;
                    Self::connect_with_retry(timeout_connect(), child)
                }
            }
            Err(ClientError::DaemonNotRunning) => {
                let child = start_daemon_background()?;
                Self::connect_with_retry(timeout_connect(), child)
            }
            Err(e) => Err(wrap_with_startup_error(e)),
        }
    }

    /// Connect to existing daemon (no auto-start)
    pub fn connect() -> Result<Self, ClientError> {
        let socket_path = daemon_socket()?;

        if !socket_path.exists() {
            let err = ClientError::DaemonNotRunning;
            log_connection_error(&err);
            return Err(err);
        }

        Ok(Self { socket_path })
    }

    fn connect_with_retry(
        timeout: Duration,
        mut child: std::process::Child,
    ) -> Result<Self, ClientError> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if let Ok(Some(status)) = child.try_wait() {
                // Exited during startup; the log may need a moment to land
                let poll_start = Instant::now();
                while poll_start.elapsed() < timeout_exit() {
                    if let Some(err) = read_startup_error() {
                        return Err(ClientError::DaemonStartFailed(err));
                    }
                    std::thread::sleep(poll_interval());
                }
                return Err(ClientError::DaemonStartFailed(format!(
                    "exited with {}",
                    status
                )));
            }

            match Self::connect() {
                Ok(client) if probe_socket(&client.socket_path) => return Ok(client),
                Ok(_) | Err(ClientError::DaemonNotRunning) => {
                    std::thread::sleep(poll_interval());
                }
                Err(e) => return Err(wrap_with_startup_error(e)),
            }
        }

        Err(wrap_with_startup_error(ClientError::DaemonStartTimeout))
    }

    async fn send_with_timeout(
        &self,
        request: &Request,
        read_timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        protocol::write_response(&mut writer, request, timeout_ipc()).await?;
        Ok(protocol::read_request(&mut reader, read_timeout).await?)
    }

    async fn send_logged(
        &self,
        request: &Request,
        read_timeout: Duration,
    ) -> Result<Response, ClientError> {
        let result = self.send_with_timeout(request, read_timeout).await;
        if let Err(e) = &result {
            log_connection_error(e);
        }
        result
    }

    /// Send a short request
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        self.send_logged(request, timeout_ipc()).await
    }

    pub async fn status(&self) -> Result<DaemonStatus, ClientError> {
        match self.send(&Request::Status).await? {
            Response::Status {
                uptime_secs,
                sessions_active,
                processes_active,
            } => Ok(DaemonStatus {
                uptime_secs,
                sessions_active,
                processes_active,
            }),
            other => Err(unexpected(other)),
        }
    }

    /// Request daemon shutdown
    pub async fn shutdown(&self, kill: bool) -> Result<(), ClientError> {
        match self.send(&Request::Shutdown { kill }).await? {
            Response::ShuttingDown => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Get daemon version via Hello handshake
    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello {
            version: PROTOCOL_VERSION.to_string(),
        };
        match self.send(&request).await? {
            Response::Hello { version } => Ok(version),
            other => Err(unexpected(other)),
        }
    }

    pub async fn execute(&self, request: ExecuteRequest) -> Result<ExecuteReport, ClientError> {
        let request = Request::Execute { request };
        match self.send_logged(&request, timeout_exec()).await? {
            Response::Executed { report } => Ok(report),
            other => Err(unexpected(other)),
        }
    }

    pub async fn cancel(&self, process_id: ProcessId) -> Result<CancelReport, ClientError> {
        let request = Request::Cancel { process_id };
        match self.send_logged(&request, timeout_exec()).await? {
            Response::Cancelled { report } => Ok(report),
            other => Err(unexpected(other)),
        }
    }

    pub async fn probe(&self, request: ProbeRequest) -> Result<ProbeReport, ClientError> {
        let request = Request::Probe { request };
        match self.send_logged(&request, timeout_exec()).await? {
            Response::Probed { report } => Ok(report),
            other => Err(unexpected(other)),
        }
    }

    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ClientError> {
        match self.send(&Request::ListSessions).await? {
            Response::Sessions { sessions } => Ok(sessions),
            other => Err(unexpected(other)),
        }
    }

    pub async fn list_processes(&self) -> Result<Vec<ProcessSummary>, ClientError> {
        match self.send(&Request::ListProcesses).await? {
            Response::Processes { processes } => Ok(processes),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(response: Response) -> ClientError {
    match response {
        Response::Error { message } => ClientError::Rejected(message),
        _ => ClientError::UnexpectedResponse,
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
