// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cg process` - Inspect executions the daemon is tracking

use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};

use cg_core::{format_duration_ms, ProcessSummary};

use crate::client::DaemonClient;
use crate::output::{print_json, truncate, OutputFormat};

#[derive(Args)]
pub struct ProcessArgs {
    #[command(subcommand)]
    pub command: ProcessCommand,
}

#[derive(Subcommand)]
pub enum ProcessCommand {
    /// List running executions started with `cg exec --id`
    List,
}

pub async fn handle(
    command: ProcessCommand,
    client: &DaemonClient,
    format: OutputFormat,
) -> Result<()> {
    match command {
        ProcessCommand::List => {
            let mut processes = client.list_processes().await?;
            processes.sort_by(|a, b| b.elapsed_ms.cmp(&a.elapsed_ms));
            match format {
                OutputFormat::Text if processes.is_empty() => println!("No running processes"),
                OutputFormat::Text => format_process_list(&mut std::io::stdout(), &processes),
                OutputFormat::Json => print_json(&processes)?,
            }
        }
    }
    Ok(())
}

fn format_process_list(w: &mut impl Write, processes: &[ProcessSummary]) {
    let _ = writeln!(w, "{:<24} {:>8} {:>8} COMMAND", "PROCESS", "PID", "ELAPSED");
    for p in processes {
        let pid = p.os_pid.map_or_else(|| "-".to_string(), |pid| pid.to_string());
        let _ = writeln!(
            w,
            "{:<24} {:>8} {:>8} {}",
            truncate(p.process_id.as_str(), 24),
            pid,
            format_duration_ms(p.elapsed_ms),
            truncate(&p.command, 80),
        );
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
