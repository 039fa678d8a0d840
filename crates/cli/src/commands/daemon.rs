// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cg daemon` - Daemon management

use std::process::Command;

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use cg_core::format_elapsed;

use crate::client::{ClientError, DaemonClient, DaemonStatus};
use crate::client_lifecycle::daemon_stop;
use crate::daemon_process::{daemon_log, find_cgd_binary};
use crate::output::{display_log, print_json, OutputFormat};

#[derive(Args)]
pub struct DaemonArgs {
    /// Print daemon version
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    #[command(subcommand)]
    pub command: Option<DaemonCommand>,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon (background unless --foreground)
    Start {
        /// Run in foreground (useful for debugging)
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the daemon
    Stop {
        /// Cancel every running execution before stopping
        #[arg(long)]
        kill: bool,
    },
    /// Stop and restart the daemon
    Restart {
        /// Cancel every running execution before restarting
        #[arg(long)]
        kill: bool,
    },
    /// Check daemon status
    Status,
    /// View daemon logs
    Logs {
        /// Number of recent lines to show
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
        /// Show all lines (no limit)
        #[arg(long, conflicts_with = "limit")]
        no_limit: bool,
        /// Follow log output
        #[arg(long, short)]
        follow: bool,
    },
}

pub async fn daemon(args: DaemonArgs, format: OutputFormat) -> Result<()> {
    if args.version {
        return version(format).await;
    }

    match args.command {
        Some(DaemonCommand::Start { foreground }) => start(foreground).await,
        Some(DaemonCommand::Stop { kill }) => stop(kill).await,
        Some(DaemonCommand::Restart { kill }) => restart(kill).await,
        Some(DaemonCommand::Status) => status(format).await,
        Some(DaemonCommand::Logs {
            limit,
            no_limit,
            follow,
        }) => logs(limit, no_limit, follow, format).await,
        None => {
            let mut cmd = crate::find_subcommand(crate::cli_command(), &["daemon"]);
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn print_not_running(format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("Daemon not running"),
        OutputFormat::Json => print_json(&serde_json::json!({ "status": "not_running" }))?,
    }
    Ok(())
}

async fn version(format: OutputFormat) -> Result<()> {
    let Ok(client) = DaemonClient::connect() else {
        return print_not_running(format);
    };
    let version = match client.hello().await {
        Ok(v) => v,
        Err(e) if e.is_not_running() => return print_not_running(format),
        Err(_) => "unknown".to_string(),
    };

    match format {
        OutputFormat::Text => println!("cgd {}", version),
        OutputFormat::Json => print_json(&serde_json::json!({ "version": version }))?,
    }
    Ok(())
}

async fn start(foreground: bool) -> Result<()> {
    if foreground {
        let status = Command::new(find_cgd_binary()).status()?;
        if !status.success() {
            return Err(anyhow!("Daemon exited with status: {}", status));
        }
        return Ok(());
    }

    if let Ok(client) = DaemonClient::connect() {
        if let Ok(status) = client.status().await {
            println!(
                "Daemon already running (uptime: {})",
                format_elapsed(status.uptime_secs)
            );
            return Ok(());
        }
    }

    DaemonClient::connect_or_start().map_err(|e| anyhow!("{}", e))?;
    println!("Daemon started");
    Ok(())
}

async fn stop(kill: bool) -> Result<()> {
    match daemon_stop(kill).await {
        Ok(true) => println!("Daemon stopped"),
        Ok(false) => println!("Daemon not running"),
        Err(e) => return Err(anyhow!("Failed to stop daemon: {}", e)),
    }
    Ok(())
}

async fn restart(kill: bool) -> Result<()> {
    let was_running = daemon_stop(kill)
        .await
        .map_err(|e| anyhow!("Failed to stop daemon: {}", e))?;

    if was_running {
        // Give the OS time to release the socket
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    }

    DaemonClient::connect_or_start().map_err(|e| anyhow!("{}", e))?;
    println!("Daemon restarted");
    Ok(())
}

async fn status(format: OutputFormat) -> Result<()> {
    let Ok(client) = DaemonClient::connect() else {
        return print_not_running(format);
    };

    let status = match client.status().await {
        Ok(status) => status,
        Err(e) if e.is_not_running() => return print_not_running(format),
        Err(e) => return Err(anyhow!("{}", e)),
    };
    let version = client
        .hello()
        .await
        .unwrap_or_else(|_: ClientError| "unknown".to_string());

    match format {
        OutputFormat::Text => print!("{}", format_status(&version, &status)),
        OutputFormat::Json => print_json(&serde_json::json!({
            "status": "running",
            "version": version,
            "uptime_secs": status.uptime_secs,
            "uptime": format_elapsed(status.uptime_secs),
            "sessions_active": status.sessions_active,
            "processes_active": status.processes_active,
        }))?,
    }
    Ok(())
}

fn format_status(version: &str, status: &DaemonStatus) -> String {
    format!(
        "Status: running\nVersion: {}\nUptime: {}\nSessions: {} active\nProcesses: {} running\n",
        version,
        format_elapsed(status.uptime_secs),
        status.sessions_active,
        status.processes_active,
    )
}

async fn logs(limit: usize, no_limit: bool, follow: bool, format: OutputFormat) -> Result<()> {
    let log_path = daemon_log()?;

    if !log_path.exists() {
        match format {
            OutputFormat::Text => println!("No log file found at {}", log_path.display()),
            OutputFormat::Json => print_json(&serde_json::json!({
                "log_path": log_path.to_string_lossy(),
                "lines": [],
            }))?,
        }
        return Ok(());
    }

    let content = if no_limit {
        std::fs::read_to_string(&log_path)?
    } else {
        read_last_lines(&log_path, limit)?
    };
    display_log(&log_path, &content, follow, format).await
}

fn read_last_lines(path: &std::path::Path, n: usize) -> Result<String> {
    use std::io::{BufRead, BufReader};
    let file = std::fs::File::open(path)?;
    let lines: Vec<String> = BufReader::new(file)
        .lines()
        .collect::<std::io::Result<_>>()?;
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].join("\n"))
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
