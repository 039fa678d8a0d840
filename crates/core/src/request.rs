// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inputs and reports of the gateway operations.
//!
//! These cross the daemon socket unchanged, so they are plain serde data.

use serde::{Deserialize, Serialize};

use crate::execution::ProcessId;
use crate::session::{ClusterTarget, Credentials, SessionId};

/// Where a command runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Directly on the machine hosting the gateway
    #[default]
    Server,
    /// Against a remote cluster through a resolved session
    Cluster,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Server => f.write_str("server"),
            Mode::Cluster => f.write_str("cluster"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub command: String,
    #[serde(default)]
    pub mode: Mode,
    /// Required in cluster mode unless `session_id` names a live session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<ClusterTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    /// Set to make the execution cancellable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_id: Option<ProcessId>,
}

impl ExecuteRequest {
    pub fn server(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            mode: Mode::Server,
            cluster: None,
            namespace: None,
            credentials: Credentials::default(),
            session_id: None,
            process_id: None,
        }
    }

    pub fn cluster(command: impl Into<String>, target: ClusterTarget) -> Self {
        Self {
            mode: Mode::Cluster,
            cluster: Some(target),
            ..Self::server(command)
        }
    }

    pub fn with_process_id(mut self, id: impl Into<ProcessId>) -> Self {
        self.process_id = Some(id.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_session(mut self, id: impl Into<SessionId>) -> Self {
        self.session_id = Some(id.into());
        self
    }
}

/// Outcome of `execute`. Failures are data, never errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteReport {
    pub success: bool,
    pub message: String,
    pub output: String,
    /// Raw diagnostic text behind a failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
    /// Resolved session, returned in cluster mode for reuse
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

/// Outcome of `cancel`. Not-found is a normal outcome with `success=false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelReport {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRequest {
    pub target: ClusterTarget,
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub success: bool,
    pub message: String,
    pub output: String,
    pub has_permissions: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

/// A live entry of the active process registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSummary {
    pub process_id: ProcessId,
    /// Composed command with credentials redacted
    pub command: String,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_pid: Option<u32>,
}
