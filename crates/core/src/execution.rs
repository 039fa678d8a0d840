// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command execution state and results

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

crate::define_id! {
    /// Caller-supplied correlation key for a cancellable execution.
    pub struct ProcessId;
}

/// Exit code the `timeout` utility uses when it had to stop its command
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Lifecycle of one command execution.
///
/// Transitions only move forward: `Running` to exactly one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Running,
    Completed,
    Killed,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid execution transition {from:?} -> {to:?}")]
pub struct TransitionError {
    pub from: ExecutionState,
    pub to: ExecutionState,
}

impl ExecutionState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ExecutionState::Running)
    }

    /// Move to `next`, rejecting anything but `Running -> terminal`
    pub fn transition(self, next: ExecutionState) -> Result<ExecutionState, TransitionError> {
        if self == ExecutionState::Running && next.is_terminal() {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }
}

impl std::fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ExecutionState::Running => "running",
            ExecutionState::Completed => "completed",
            ExecutionState::Killed => "killed",
            ExecutionState::TimedOut => "timed_out",
        };
        f.write_str(s)
    }
}

/// How a process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExitState {
    /// Exited on its own with this code
    Exited { code: i32 },
    /// Ended by a signal nobody in the gateway sent
    Signaled { signal: i32 },
    /// Stopped by the executor's hard deadline
    TimedOut,
    /// Stopped by a cancellation request
    Killed,
}

impl ExitState {
    pub fn execution_state(self) -> ExecutionState {
        match self {
            ExitState::Exited { .. } | ExitState::Signaled { .. } => ExecutionState::Completed,
            ExitState::TimedOut => ExecutionState::TimedOut,
            ExitState::Killed => ExecutionState::Killed,
        }
    }

    pub fn code(self) -> Option<i32> {
        match self {
            ExitState::Exited { code } => Some(code),
            _ => None,
        }
    }
}

/// Terminal result of a supervised execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit: ExitState,
    /// Wall clock from spawn to terminal state, floor-adjusted
    pub elapsed: Duration,
}

impl ExecutionResult {
    pub fn state(&self) -> ExecutionState {
        self.exit.execution_state()
    }

    /// Success as the operator sees it.
    ///
    /// Exit code 124 counts as success when the command ran under a
    /// `timeout` directive: the wrapper already enforced the time budget.
    pub fn is_success(&self, under_timeout_directive: bool) -> bool {
        match self.exit {
            ExitState::Exited { code: 0 } => true,
            ExitState::Exited {
                code: TIMEOUT_EXIT_CODE,
            } => under_timeout_directive,
            _ => false,
        }
    }

    /// stdout followed by stderr, separated by a newline when both are present
    pub fn combined_output(&self) -> String {
        combine_output(&self.stdout, &self.stderr)
    }
}

pub fn combine_output(stdout: &str, stderr: &str) -> String {
    match (stdout.is_empty(), stderr.is_empty()) {
        (_, true) => stdout.to_string(),
        (true, false) => stderr.to_string(),
        (false, false) if stdout.ends_with('\n') => format!("{stdout}{stderr}"),
        (false, false) => format!("{stdout}\n{stderr}"),
    }
}

/// Report `floor` instead of anything shorter.
///
/// Clock resolution can make a fast command measure as zero, which reads
/// as "did not run" in the UI.
pub fn floor_duration(elapsed: Duration, floor: Duration) -> Duration {
    elapsed.max(floor)
}

#[cfg(test)]
#[path = "execution_tests.rs"]
mod tests;
