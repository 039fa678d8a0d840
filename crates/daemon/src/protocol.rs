// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC Protocol for daemon communication.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload

use cg_core::{
    CancelReport, ExecuteReport, ExecuteRequest, ProbeReport, ProbeRequest, ProcessId,
    ProcessSummary, SessionSummary,
};
use serde::{Deserialize, Serialize};

#[path = "protocol_wire.rs"]
mod wire;
pub use wire::{
    decode, encode, read_message, read_request, write_message, write_response, ProtocolError,
    DEFAULT_TIMEOUT, MAX_MESSAGE_SIZE, PROTOCOL_VERSION,
};

/// Request from CLI to daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Get daemon status
    Status,

    /// Request daemon shutdown
    Shutdown {
        /// Cancel every tracked execution before stopping
        #[serde(default)]
        kill: bool,
    },

    /// Run a command in server or cluster mode
    Execute { request: ExecuteRequest },

    /// Terminate a tracked execution
    Cancel { process_id: ProcessId },

    /// Check cluster reachability and permissions
    Probe { request: ProbeRequest },

    ListSessions,

    ListProcesses,
}

/// Response from daemon to CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Response {
    Pong,

    Hello {
        version: String,
    },

    ShuttingDown,

    Status {
        uptime_secs: u64,
        sessions_active: usize,
        processes_active: usize,
    },

    Executed {
        report: ExecuteReport,
    },

    Cancelled {
        report: CancelReport,
    },

    Probed {
        report: ProbeReport,
    },

    Sessions {
        sessions: Vec<SessionSummary>,
    },

    Processes {
        processes: Vec<ProcessSummary>,
    },

    /// The request could not be handled at all
    Error {
        message: String,
    },
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
