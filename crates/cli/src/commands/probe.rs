// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cg probe` - Check that a cluster is reachable with the given credentials

use anyhow::Result;
use clap::Args;

use cg_core::{format_duration_ms, ClusterTarget, ProbeReport, ProbeRequest, SessionId};

use super::target::CredentialArgs;
use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{failure, print_json, OutputFormat};

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Cluster name
    #[arg(long, value_name = "NAME")]
    pub cluster: String,

    /// Cloud region of the cluster
    #[arg(long, value_name = "REGION")]
    pub region: String,

    /// Named cloud CLI profile
    #[arg(long, value_name = "PROFILE")]
    pub profile: Option<String>,

    /// Reuse an existing session instead of creating one
    #[arg(long, value_name = "SESSION")]
    pub session: Option<String>,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

impl ProbeArgs {
    pub fn into_request(self) -> Result<ProbeRequest> {
        let mut target = ClusterTarget::new(self.cluster, self.region);
        if let Some(profile) = self.profile {
            target = target.with_profile(profile);
        }
        Ok(ProbeRequest {
            target,
            credentials: self.credentials.resolve()?,
            session_id: self.session.map(SessionId::new),
        })
    }
}

pub async fn handle(args: ProbeArgs, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let report = client.probe(args.into_request()?).await?;
    render(&report, format)
}

fn render(report: &ProbeReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            if !report.success {
                return Err(failure(&report.message, Some(&report.output)).into());
            }
            println!("{}", report.message);
            if let Some(context) = &report.context {
                println!("Context: {}", context);
            }
            println!(
                "Permissions: {}",
                if report.has_permissions { "ok" } else { "denied" }
            );
            if let Some(session) = &report.session_id {
                println!("Session: {}", session);
            }
            println!("Took: {}", format_duration_ms(report.duration_ms));
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
