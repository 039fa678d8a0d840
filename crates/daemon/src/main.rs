// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command Gateway Daemon (cgd)
//!
//! Background process that owns the session store and the active process
//! registry, and runs every command on behalf of the `cg` CLI.
//!
//! Architecture:
//! - Listener Task: accepts socket connections, one task per request
//! - Main Loop: waits for shutdown and runs the periodic eviction sweep

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod env;
mod lifecycle;
mod listener;
mod protocol;

use std::path::Path;
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::{error, info};

use crate::lifecycle::{Config, LifecycleError, StartupResult};
use crate::listener::{ListenCtx, Listener};
use crate::protocol::PROTOCOL_VERSION;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle info flags before any config/lock acquisition
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("cgd {PROTOCOL_VERSION}");
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("cgd {PROTOCOL_VERSION}");
                println!("Command Gateway Daemon - runs shell and cluster commands for the `cg` CLI");
                println!();
                println!("USAGE:");
                println!("    cgd");
                println!();
                println!("The daemon is typically started by the `cg` CLI and should not");
                println!("be invoked directly. It listens on a Unix socket for requests");
                println!("from `cg`.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: cgd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    rotate_log_if_needed(&config.log_path);
    // Before tracing setup, so the CLI can find where this attempt begins
    write_startup_marker(&config)?;
    let log_guard = setup_logging(&config)?;

    info!("Starting daemon");

    let StartupResult {
        mut daemon,
        listener: unix_listener,
    } = match lifecycle::startup(&config).await {
        Ok(r) => r,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&config.lock_path)
                .unwrap_or_default()
                .trim()
                .to_string();
            let version = std::fs::read_to_string(&config.version_path)
                .unwrap_or_default()
                .trim()
                .to_string();

            eprintln!("cgd is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            if !version.is_empty() {
                if version == PROTOCOL_VERSION {
                    eprintln!("  version: {version}");
                } else {
                    eprintln!("  version: {version} (outdated, current: {PROTOCOL_VERSION})");
                }
            }
            std::process::exit(1);
        }
        Err(e) => {
            // Written synchronously: the non-blocking writer may not flush in time
            write_startup_error(&config, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let shutdown_notify = Arc::new(Notify::new());
    let listener = Listener::new(
        unix_listener,
        ListenCtx {
            gateway: daemon.gateway.clone(),
            start_time: daemon.start_time,
            shutdown: Arc::clone(&shutdown_notify),
        },
    );
    tokio::spawn(listener.run());

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    // Created outside the loop so activity never resets it
    let sweep_every = env::sweep_interval_ms().unwrap_or(daemon.gateway.config().sweep_interval());
    let mut sweep = tokio::time::interval(sweep_every);
    sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!(
        "Daemon ready, listening on {}",
        config.socket_path.display()
    );
    // Signal ready for a parent process waiting on startup
    println!("READY");

    let mut kill_on_exit = false;
    loop {
        tokio::select! {
            _ = shutdown_notify.notified() => {
                info!("Shutdown requested via command");
                break;
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                kill_on_exit = true;
                break;
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down...");
                kill_on_exit = true;
                break;
            }
            _ = sweep.tick() => {
                daemon.gateway.sweep().await;
            }
        }
    }

    // A command-driven shutdown already cancelled when asked to
    if kill_on_exit {
        let cancelled = daemon.gateway.cancel_all().await;
        if cancelled > 0 {
            info!(cancelled, "cancelled tracked executions");
        }
    }
    daemon.shutdown()?;
    info!("Daemon stopped");
    Ok(())
}

/// Rotate `daemon.log` past this size
pub const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Rotated files kept: `daemon.log.1` (newest) to `daemon.log.3`
const MAX_ROTATIONS: u32 = 3;

/// Shift `log`, `log.1`, `log.2` up by one when `log` is too large.
/// The oldest rotation falls off the end.
fn rotate_log_if_needed(log: &Path) {
    let Ok(meta) = std::fs::metadata(log) else {
        return;
    };
    if meta.len() <= MAX_LOG_SIZE {
        return;
    }
    let rotated = |n: u32| {
        let mut name = log.as_os_str().to_owned();
        name.push(format!(".{n}"));
        std::path::PathBuf::from(name)
    };
    for n in (1..MAX_ROTATIONS).rev() {
        let from = rotated(n);
        if from.exists() {
            let _ = std::fs::rename(&from, rotated(n + 1));
        }
    }
    let _ = std::fs::rename(log, rotated(1));
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- cgd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- cgd: starting (pid: ";

fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    use std::io::Write;

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;
    Ok(())
}

fn write_startup_error(config: &Config, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {}", error);
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let dir = config.log_path.parent().ok_or(LifecycleError::NoStateDir)?;
    let file = config
        .log_path
        .file_name()
        .ok_or(LifecycleError::NoStateDir)?;
    std::fs::create_dir_all(dir)?;

    let (non_blocking, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
