// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess spawning, output streaming and termination.
//!
//! Every command runs as the leader of its own process group so that a
//! termination signal reaches the whole tree (the shell, a `timeout`
//! wrapper, and whatever they started). Output is read by one task per
//! stream and delivered as ordered chunks over a bounded channel.

use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use cg_core::ExitState;
use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use crate::output::{OutputBuffer, OutputChunk, StreamKind};
use crate::shell::Shell;

/// Chunks buffered between the reader tasks and the supervisor
pub const OUTPUT_CHANNEL_CAPACITY: usize = 64;

const READ_CHUNK_SIZE: usize = 8192;

/// Errors from process operations
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("no usable shell found (tried: {0})")]
    ShellNotFound(String),
    #[error("failed to spawn shell: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("failed to wait for process: {0}")]
    Wait(#[source] std::io::Error),
    #[error("failed to send {signal} to process group {pid}: {errno}")]
    Signal {
        pid: u32,
        signal: Signal,
        errno: Errno,
    },
}

/// What to run: a full shell line plus extra environment
#[derive(Debug, Clone, Default)]
pub struct ProcessSpec {
    pub line: String,
    pub env: Vec<(String, String)>,
}

impl ProcessSpec {
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            ..Self::default()
        }
    }
}

/// A spawned process split into its control handle and its output stream.
///
/// The two halves are separate so a supervisor can wait on exit and read
/// output in the same `select!`.
pub struct SpawnedProcess {
    pub handle: ProcessHandle,
    pub output: OutputStream,
}

/// Spawn `spec` under `shell -c` in a new process group.
pub fn spawn(shell: &Shell, spec: &ProcessSpec) -> Result<SpawnedProcess, ProcessError> {
    let mut cmd = Command::new(shell.program());
    cmd.arg("-c")
        .arg(&spec.line)
        .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(ProcessError::Spawn)?;
    let pid = child.id();

    let (tx, rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(read_stream(stdout, StreamKind::Stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(read_stream(stderr, StreamKind::Stderr, tx));
    }

    tracing::debug!(pid, "process spawned");

    Ok(SpawnedProcess {
        handle: ProcessHandle { child, pid },
        output: OutputStream { rx },
    })
}

async fn read_stream<R>(mut reader: R, stream: StreamKind, tx: mpsc::Sender<OutputChunk>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let chunk = OutputChunk {
                    stream,
                    bytes: buf[..n].to_vec(),
                };
                if tx.send(chunk).await.is_err() {
                    // Supervisor is gone; nobody wants the rest
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(?stream, error = %e, "output read failed");
                break;
            }
        }
    }
}

/// Receiving half of a process's output
pub struct OutputStream {
    rx: mpsc::Receiver<OutputChunk>,
}

impl OutputStream {
    /// Next chunk, or `None` once both streams reached EOF
    pub async fn recv(&mut self) -> Option<OutputChunk> {
        self.rx.recv().await
    }

    /// Pull remaining chunks into `buffer` until both streams close or
    /// `window` elapses. Background grandchildren can hold a pipe open
    /// long after the shell exits, so this never waits unbounded.
    pub async fn drain_into(&mut self, buffer: &mut OutputBuffer, window: Duration) {
        let deadline = tokio::time::Instant::now() + window;
        loop {
            match tokio::time::timeout_at(deadline, self.rx.recv()).await {
                Ok(Some(chunk)) => buffer.push(chunk),
                Ok(None) => break,
                Err(_) => {
                    tracing::debug!("output drain window elapsed with pipes still open");
                    break;
                }
            }
        }
    }
}

/// How a termination request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The process had already exited before any signal was sent
    AlreadyExited(ExitStatus),
    /// Exited within the grace window after SIGTERM
    Graceful(ExitStatus),
    /// Needed SIGKILL
    Forced(ExitStatus),
}

/// Control half of a spawned process
pub struct ProcessHandle {
    child: Child,
    pid: Option<u32>,
}

impl ProcessHandle {
    /// OS pid (also the process group id)
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Wait for natural exit. Cancellation safe.
    pub async fn wait(&mut self) -> Result<ExitStatus, ProcessError> {
        self.child.wait().await.map_err(ProcessError::Wait)
    }

    /// SIGTERM the process group, wait up to `grace`, then SIGKILL.
    ///
    /// Signalling a group that already exited is not an error.
    pub async fn terminate(&mut self, grace: Duration) -> Result<Termination, ProcessError> {
        if let Some(status) = self.child.try_wait().map_err(ProcessError::Wait)? {
            return Ok(Termination::AlreadyExited(status));
        }

        self.signal(Signal::SIGTERM)?;
        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(status) => {
                let status = status.map_err(ProcessError::Wait)?;
                tracing::debug!(pid = self.pid, "process exited after SIGTERM");
                Ok(Termination::Graceful(status))
            }
            Err(_) => {
                tracing::warn!(
                    pid = self.pid,
                    grace_ms = grace.as_millis() as u64,
                    "process ignored SIGTERM, sending SIGKILL"
                );
                self.signal(Signal::SIGKILL)?;
                if let Err(e) = self.child.start_kill() {
                    tracing::debug!(pid = self.pid, error = %e, "direct kill after SIGKILL");
                }
                let status = self.child.wait().await.map_err(ProcessError::Wait)?;
                Ok(Termination::Forced(status))
            }
        }
    }

    fn signal(&self, signal: Signal) -> Result<(), ProcessError> {
        let Some(pid) = self.pid else {
            return Ok(());
        };
        signal_group(pid, signal)
    }
}

/// Send `signal` to the process group led by `pid`.
///
/// A group that no longer exists (`ESRCH`) is treated as success: the
/// signal raced a natural exit and lost.
pub fn signal_group(pid: u32, signal: Signal) -> Result<(), ProcessError> {
    let raw = i32::try_from(pid).map_err(|_| ProcessError::Signal {
        pid,
        signal,
        errno: Errno::EINVAL,
    })?;
    match killpg(Pid::from_raw(raw), signal) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(ProcessError::Signal { pid, signal, errno }),
    }
}

/// Map an OS exit status to the gateway's exit model
pub fn exit_state(status: ExitStatus) -> ExitState {
    match (status.code(), status.signal()) {
        (Some(code), _) => ExitState::Exited { code },
        (None, Some(signal)) => ExitState::Signaled { signal },
        (None, None) => ExitState::Exited { code: -1 },
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
