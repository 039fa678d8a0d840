// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway configuration, loaded from an optional `config.toml`

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Every key is optional; missing keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Blanket hard deadline for any command
    pub ceiling_secs: u64,
    /// Headroom above an advisory `timeout` wrap
    pub advisory_margin_secs: u64,
    /// SIGTERM to SIGKILL grace window
    pub kill_grace_ms: u64,
    /// How long to keep reading pipes after the process exits
    pub drain_ms: u64,
    pub duration_floor_ms: u64,
    /// Hosting shell. Auto-detected (bash, then sh) when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    pub cloud_cli: String,
    pub cluster_cli: String,
    pub session_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    /// Give each session its own KUBECONFIG file
    pub isolate_kubeconfig: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            ceiling_secs: 30,
            advisory_margin_secs: 5,
            kill_grace_ms: 2000,
            drain_ms: 500,
            duration_floor_ms: 10,
            shell: None,
            cloud_cli: "aws".to_string(),
            cluster_cli: "kubectl".to_string(),
            session_ttl_secs: 3600,
            sweep_interval_secs: 60,
            isolate_kubeconfig: true,
        }
    }
}

impl GatewayConfig {
    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ceiling_secs == 0 {
            return Err(ConfigError::Invalid("ceiling_secs must be positive".into()));
        }
        if self.cloud_cli.trim().is_empty() || self.cluster_cli.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "cloud_cli and cluster_cli must not be empty".into(),
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "sweep_interval_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn ceiling(&self) -> Duration {
        Duration::from_secs(self.ceiling_secs)
    }

    pub fn advisory_margin(&self) -> Duration {
        Duration::from_secs(self.advisory_margin_secs)
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }

    pub fn drain(&self) -> Duration {
        Duration::from_millis(self.drain_ms)
    }

    pub fn duration_floor(&self) -> Duration {
        Duration::from_millis(self.duration_floor_ms)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Longest a cancel waits for the supervisor to confirm termination
    pub fn cancel_wait(&self) -> Duration {
        self.kill_grace() + self.drain() + Duration::from_secs(1)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
