// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cg exec` - Run a command on this host or against a cluster

use anyhow::Result;
use clap::Args;

use cg_core::{format_duration_ms, ExecuteReport, ExecuteRequest, Mode, ProcessId, SessionId};

use super::target::{ClusterArgs, CredentialArgs};
use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{failure, print_captured, print_json, OutputFormat};

#[derive(Args, Debug)]
pub struct ExecArgs {
    #[command(flatten)]
    pub cluster: ClusterArgs,

    /// Namespace for cluster commands
    #[arg(short = 'n', long, value_name = "NAMESPACE")]
    pub namespace: Option<String>,

    /// Reuse a session returned by an earlier cluster command
    #[arg(long, value_name = "SESSION")]
    pub session: Option<String>,

    /// Track the execution under this id so `cg cancel <id>` can stop it
    #[arg(long = "id", value_name = "PROCESS_ID")]
    pub process_id: Option<String>,

    #[command(flatten)]
    pub credentials: CredentialArgs,

    /// Command to run (use `--` before commands with flags)
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl ExecArgs {
    /// Cluster mode when a cluster or a session is named.
    pub fn into_request(self) -> Result<ExecuteRequest> {
        let command = self.command.join(" ");
        let cluster_mode = self.cluster.cluster.is_some() || self.session.is_some();
        let mut request = match self.cluster.target() {
            Some(target) => ExecuteRequest::cluster(command, target),
            None => ExecuteRequest {
                mode: if cluster_mode {
                    Mode::Cluster
                } else {
                    Mode::Server
                },
                ..ExecuteRequest::server(command)
            },
        };
        if cluster_mode {
            request = request.with_credentials(self.credentials.resolve()?);
        }
        if let Some(namespace) = self.namespace {
            request = request.with_namespace(namespace);
        }
        if let Some(session) = self.session {
            request = request.with_session(SessionId::new(session));
        }
        if let Some(id) = self.process_id {
            request = request.with_process_id(ProcessId::new(id));
        }
        Ok(request)
    }
}

pub async fn handle(args: ExecArgs, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let report = client.execute(args.into_request()?).await?;
    render(&report, format)
}

/// Output goes to stdout untouched; the summary line goes to stderr so
/// pipelines see only what the command printed.
fn render(report: &ExecuteReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            print_captured(&report.output);
            if let Some(session) = &report.session_id {
                eprintln!("session: {}", session);
            }
            if !report.success {
                return Err(failure(&report.message, report.error.as_deref()).into());
            }
            eprintln!(
                "{} ({})",
                report.message,
                format_duration_ms(report.duration_ms)
            );
        }
        OutputFormat::Json => {
            print_json(report)?;
            if !report.success {
                return Err(ExitError::silent(1).into());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
