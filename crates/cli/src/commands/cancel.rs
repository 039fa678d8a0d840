// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cg cancel` - Stop a tracked execution

use anyhow::Result;
use clap::Args;

use cg_core::{CancelReport, ProcessId};

use crate::client::DaemonClient;
use crate::exit_error::ExitError;
use crate::output::{failure, print_captured, print_json, OutputFormat};

#[derive(Args, Debug)]
pub struct CancelArgs {
    /// Process id given to `cg exec --id`
    pub id: String,
}

pub async fn handle(args: CancelArgs, client: &DaemonClient, format: OutputFormat) -> Result<()> {
    let report = client.cancel(ProcessId::new(args.id)).await?;
    render(&report, format)
}

fn render(report: &CancelReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            if !report.success {
                return Err(failure(&report.message, None).into());
            }
            println!("{}", report.message);
            print_captured(&report.output);
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
