// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cg session` - Inspect cluster sessions held by the daemon

use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};

use cg_core::SessionSummary;

use crate::client::DaemonClient;
use crate::output::{format_time_ago, print_json, truncate, OutputFormat};

#[derive(Args)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// List live sessions (credentials are never shown)
    List,
}

pub async fn handle(
    command: SessionCommand,
    client: &DaemonClient,
    format: OutputFormat,
) -> Result<()> {
    match command {
        SessionCommand::List => {
            let mut sessions = client.list_sessions().await?;
            sessions.sort_by(|a, b| b.last_activity_ms.cmp(&a.last_activity_ms));
            match format {
                OutputFormat::Text if sessions.is_empty() => println!("No sessions"),
                OutputFormat::Text => format_session_list(&mut std::io::stdout(), &sessions),
                OutputFormat::Json => print_json(&sessions)?,
            }
        }
    }
    Ok(())
}

fn format_session_list(w: &mut impl Write, sessions: &[SessionSummary]) {
    let _ = writeln!(
        w,
        "{:<38} {:<24} {:<14} {:<12} {:<6} LAST ACTIVE",
        "SESSION", "CLUSTER", "REGION", "PROFILE", "CREDS"
    );
    for s in sessions {
        let _ = writeln!(
            w,
            "{:<38} {:<24} {:<14} {:<12} {:<6} {}",
            s.id.as_str(),
            truncate(&s.cluster_name, 24),
            truncate(&s.region, 14),
            truncate(s.profile.as_deref().unwrap_or("-"), 12),
            if s.has_credentials { "yes" } else { "no" },
            format_time_ago(s.last_activity_ms),
        );
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
