// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! cg - Command Gateway CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod client_lifecycle;
mod commands;
mod daemon_process;
mod env;
mod exit_error;
mod output;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

use crate::client::DaemonClient;
use crate::commands::{cancel, daemon, exec, probe, process, session};
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "cg",
    version = cg_daemon::PROTOCOL_VERSION,
    about = "Command Gateway - run shell and cluster commands through a local daemon"
)]
struct Cli {
    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command on this host, or against a cluster with --cluster/--session
    Exec(exec::ExecArgs),
    /// Cancel an execution started with `cg exec --id`
    Cancel(cancel::CancelArgs),
    /// Check connectivity and permissions for a cluster
    Probe(probe::ProbeArgs),
    /// Session management
    Session(session::SessionArgs),
    /// Running execution management
    Process(process::ProcessArgs),
    /// Daemon management
    Daemon(daemon::DaemonArgs),
}

pub(crate) fn cli_command() -> clap::Command {
    Cli::command()
}

/// Descend into nested subcommands by name, returning the deepest match.
pub(crate) fn find_subcommand(mut cmd: clap::Command, path: &[&str]) -> clap::Command {
    for name in path {
        let Some(sub) = cmd.find_subcommand(name).cloned() else {
            break;
        };
        cmd = sub;
    }
    cmd
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let code = e
            .downcast_ref::<exit_error::ExitError>()
            .map_or(1, |c| c.code);
        let msg = format_error(&e);
        if !msg.is_empty() {
            eprintln!("Error: {}", msg);
        }
        std::process::exit(code);
    }
}

/// Render an anyhow error, skipping causes the top-level text already repeats.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();

    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));
    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.output;

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    // Commands that run something start the daemon on demand; listings
    // only talk to one that is already up.
    match command {
        Commands::Exec(args) => {
            let client = DaemonClient::for_action()?;
            exec::handle(args, &client, format).await?
        }
        Commands::Probe(args) => {
            let client = DaemonClient::for_action()?;
            probe::handle(args, &client, format).await?
        }
        Commands::Cancel(args) => {
            let client = DaemonClient::for_query()?;
            cancel::handle(args, &client, format).await?
        }
        Commands::Session(args) => {
            let client = DaemonClient::for_query()?;
            session::handle(args.command, &client, format).await?
        }
        Commands::Process(args) => {
            let client = DaemonClient::for_query()?;
            process::handle(args.command, &client, format).await?
        }
        Commands::Daemon(args) => daemon::daemon(args, format).await?,
    }

    Ok(())
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
