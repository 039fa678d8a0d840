// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster sessions: which cluster a command targets and with what credentials.
//!
//! A session is created the first time an operator runs a cluster-mode
//! command and is reused by id afterwards. Credentials are never validated
//! here; a bad key only shows up when the composed command runs.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Opaque token identifying a cluster session.
    pub struct SessionId;
}

/// Identity of the remote cluster a session points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterTarget {
    pub cluster_name: String,
    pub region: String,
    /// Named cloud CLI profile, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

impl ClusterTarget {
    pub fn new(cluster_name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            region: region.into(),
            profile: None,
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }
}

/// Cloud credentials supplied by the operator.
///
/// Either discrete key fields or a raw block of `export KEY=value` lines as
/// copied from a cloud console. Both may be present; the block is applied
/// after the discrete fields.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_block: Option<String>,
}

impl Credentials {
    pub fn keys(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: Some(access_key_id.into()),
            secret_access_key: Some(secret_access_key.into()),
            ..Self::default()
        }
    }

    pub fn from_export_block(block: impl Into<String>) -> Self {
        Self {
            export_block: Some(block.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_key_id.is_none()
            && self.secret_access_key.is_none()
            && self.session_token.is_none()
            && self
                .export_block
                .as_deref()
                .map_or(true, |b| b.trim().is_empty())
    }
}

// Secrets must never reach logs through `{:?}`.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id.as_deref().map(redact))
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "***"))
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .field(
                "export_block",
                &self.export_block.as_ref().map(|b| format!("<{} lines>", b.lines().count())),
            )
            .finish()
    }
}

/// Keep a short, non-secret prefix of an identifier for diagnostics
pub fn redact(value: &str) -> String {
    let visible: String = value.chars().take(4).collect();
    if visible.len() < value.len() {
        format!("{visible}***")
    } else {
        "***".to_string()
    }
}

/// A resolved cluster execution context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub target: ClusterTarget,
    pub credentials: Credentials,
    /// Epoch milliseconds of the last resolve; strictly increasing per session
    pub last_activity_ms: u64,
    pub created_at_ms: u64,
}

impl Session {
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            cluster_name: self.target.cluster_name.clone(),
            region: self.target.region.clone(),
            profile: self.target.profile.clone(),
            has_credentials: !self.credentials.is_empty(),
            created_at_ms: self.created_at_ms,
            last_activity_ms: self.last_activity_ms,
        }
    }
}

/// Credential-free view of a session for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub cluster_name: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    pub has_credentials: bool,
    pub created_at_ms: u64,
    pub last_activity_ms: u64,
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
