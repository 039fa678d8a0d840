// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cg-core: data model shared by the command gateway, its daemon and CLI

pub mod clock;
pub mod execution;
pub mod id;
pub mod request;
pub mod session;
pub mod time_fmt;

pub use clock::{Clock, FakeClock, SystemClock};
pub use execution::{
    combine_output, floor_duration, ExecutionResult, ExecutionState, ExitState, ProcessId,
    TransitionError, TIMEOUT_EXIT_CODE,
};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use request::{
    CancelReport, ExecuteReport, ExecuteRequest, Mode, ProbeReport, ProbeRequest, ProcessSummary,
};
pub use session::{redact, ClusterTarget, Credentials, Session, SessionId, SessionSummary};
pub use time_fmt::{format_duration_ms, format_elapsed};
