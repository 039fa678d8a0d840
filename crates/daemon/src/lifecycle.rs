// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use cg_adapters::ProcessError;
use cg_engine::{ConfigError, Gateway, GatewayConfig, GatewayDeps};
use fs2::FileExt;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::protocol::PROTOCOL_VERSION;

/// Daemon file layout
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/cg)
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    /// Lock file, also holds the PID
    pub lock_path: PathBuf,
    pub version_path: PathBuf,
    pub log_path: PathBuf,
    /// Optional gateway settings
    pub config_path: PathBuf,
    /// Per-session kubeconfig files
    pub kube_dir: PathBuf,
}

impl Config {
    /// Fixed paths under the resolved state directory
    pub fn load() -> Result<Self, LifecycleError> {
        Ok(Self::under(crate::env::state_dir()?))
    }

    pub fn under(state_dir: PathBuf) -> Self {
        Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            config_path: state_dir.join("config.toml"),
            kube_dir: state_dir.join("kube"),
            state_dir,
        }
    }
}

/// Daemon state during operation
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub gateway: Gateway,
    pub start_time: Instant,
}

/// Startup output: the daemon state plus the bound socket for the listener task
pub struct StartupResult {
    pub daemon: DaemonState,
    pub listener: UnixListener,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No usable shell: {0}")]
    Shell(#[from] ProcessError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DaemonState {
    /// Remove the socket, PID and version files and every session kubeconfig.
    ///
    /// Tracked executions are cancelled by the caller beforehand when
    /// requested; anything left is killed when the runtime drops.
    pub fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        for path in [
            &self.config.socket_path,
            &self.config.lock_path,
            &self.config.version_path,
        ] {
            remove_if_present(path);
        }
        match std::fs::remove_dir_all(&self.config.kube_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove kubeconfig directory: {}", e),
        }

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // Don't clean up if we failed to acquire the lock:
            // those files belong to the already-running daemon.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    // 1. State directory
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Lock first. Open without truncating so a running daemon's PID survives.
    let mut lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    {
        use std::io::Write;
        lock_file.set_len(0)?;
        writeln!(lock_file, "{}", std::process::id())?;
    }

    // 3. Version file and kubeconfig directory
    std::fs::write(&config.version_path, PROTOCOL_VERSION)?;
    std::fs::create_dir_all(&config.kube_dir)?;

    // 4. Gateway settings and collaborators
    let gateway_config = GatewayConfig::load(&config.config_path)?;
    let deps = GatewayDeps::system(&gateway_config, Some(config.kube_dir.clone()))?;
    info!(
        shell = %deps.shell.program().display(),
        ceiling_secs = gateway_config.ceiling_secs,
        session_ttl_secs = gateway_config.session_ttl_secs,
        isolate_kubeconfig = gateway_config.isolate_kubeconfig,
        "gateway configured"
    );
    let gateway = Gateway::new(gateway_config, deps);

    // 5. Remove stale socket and bind (LAST - only after all validation passes)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!("Daemon started");
    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
            gateway,
            start_time: Instant::now(),
        },
        listener,
    })
}

fn remove_if_present(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    for path in [
        &config.socket_path,
        &config.version_path,
        &config.lock_path,
    ] {
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
