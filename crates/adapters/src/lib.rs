// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for external I/O: the hosting shell and the processes it runs

pub mod output;
pub mod shell;
pub mod subprocess;

pub use output::{OutputBuffer, OutputChunk, StreamKind, TRUNCATION_MARKER};
pub use shell::Shell;
pub use subprocess::{
    exit_state, signal_group, spawn, OutputStream, ProcessError, ProcessHandle,
    ProcessSpec, SpawnedProcess, Termination,
};
