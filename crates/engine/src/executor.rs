// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process executor: spawn a shell line and supervise it to a terminal state.
//!
//! One supervisor loop serves both strategies. It races natural exit, the
//! hard deadline and (for tracked runs) a cancel request, appending output
//! chunks as they arrive. After exit the pipes are drained for a bounded
//! window, then the buffers are frozen into an [`ExecutionResult`].

use std::time::{Duration, Instant};

use cg_adapters::{
    exit_state, spawn, OutputBuffer, ProcessError, ProcessSpec, Shell, SpawnedProcess, Termination,
};
use cg_core::{floor_duration, ExecutionResult, ExecutionState, ExitState};
use tokio::sync::{mpsc, oneshot};

use crate::registry::CancelRequest;

/// Timing knobs shared by every execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorTiming {
    pub kill_grace: Duration,
    pub drain: Duration,
    pub floor: Duration,
}

#[derive(Debug, Clone)]
pub struct Executor {
    shell: Shell,
    timing: ExecutorTiming,
}

impl Executor {
    pub fn new(shell: Shell, timing: ExecutorTiming) -> Self {
        Self { shell, timing }
    }

    pub fn spawn(&self, spec: &ProcessSpec) -> Result<SpawnedProcess, ProcessError> {
        spawn(&self.shell, spec)
    }

    /// Buffered wait: run to completion or deadline. Not cancellable.
    pub async fn run(
        &self,
        spec: &ProcessSpec,
        deadline: Duration,
    ) -> Result<ExecutionResult, ProcessError> {
        let process = self.spawn(spec)?;
        self.supervise(process, deadline, None).await
    }

    /// Drive a spawned process to a terminal state.
    ///
    /// With `control`, a [`CancelRequest`] terminates the process and the
    /// result is sent back on the request's reply channel as well as
    /// returned.
    pub async fn supervise(
        &self,
        process: SpawnedProcess,
        deadline: Duration,
        mut control: Option<&mut mpsc::Receiver<CancelRequest>>,
    ) -> Result<ExecutionResult, ProcessError> {
        let SpawnedProcess {
            mut handle,
            mut output,
        } = process;
        let pid = handle.pid();
        let started = Instant::now();
        let mut state = ExecutionState::Running;
        let mut buffer = OutputBuffer::default();
        let mut output_open = true;
        let mut cancel_reply: Option<oneshot::Sender<ExecutionResult>> = None;

        let sleep = tokio::time::sleep(deadline);
        tokio::pin!(sleep);

        let exit = loop {
            tokio::select! {
                chunk = output.recv(), if output_open => match chunk {
                    Some(chunk) => buffer.push(chunk),
                    None => output_open = false,
                },
                status = handle.wait() => {
                    break exit_state(status?);
                }
                _ = &mut sleep => {
                    tracing::warn!(
                        pid,
                        deadline_ms = deadline.as_millis() as u64,
                        "deadline reached, terminating"
                    );
                    break match handle.terminate(self.timing.kill_grace).await? {
                        Termination::AlreadyExited(status) => exit_state(status),
                        Termination::Graceful(_) | Termination::Forced(_) => ExitState::TimedOut,
                    };
                }
                request = next_cancel(&mut control) => match request {
                    Some(request) => {
                        tracing::info!(pid, "cancel requested, terminating");
                        cancel_reply = Some(request.reply);
                        break match handle.terminate(self.timing.kill_grace).await? {
                            Termination::AlreadyExited(status) => exit_state(status),
                            Termination::Graceful(_) | Termination::Forced(_) => ExitState::Killed,
                        };
                    }
                    // Registry entry gone without a request; keep running to the deadline
                    None => control = None,
                },
            }
        };

        if output_open {
            output.drain_into(&mut buffer, self.timing.drain).await;
        }
        state = match state.transition(exit.execution_state()) {
            Ok(next) => next,
            Err(e) => {
                tracing::error!(error = %e, "unexpected execution transition");
                exit.execution_state()
            }
        };

        let elapsed = floor_duration(started.elapsed(), self.timing.floor);
        tracing::info!(
            pid,
            %state,
            code = exit.code(),
            elapsed_ms = elapsed.as_millis() as u64,
            truncated = buffer.is_truncated(),
            "process finished"
        );

        let result = ExecutionResult {
            stdout: buffer.stdout(),
            stderr: buffer.stderr(),
            exit,
            elapsed,
        };
        if let Some(reply) = cancel_reply {
            if reply.send(result.clone()).is_err() {
                tracing::debug!(pid, "canceller stopped waiting for the result");
            }
        }
        Ok(result)
    }
}

async fn next_cancel(
    control: &mut Option<&mut mpsc::Receiver<CancelRequest>>,
) -> Option<CancelRequest> {
    match control {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
