// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster and credential flags shared by `cg exec` and `cg probe`.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use cg_core::{ClusterTarget, Credentials};

#[derive(Args, Debug, Default)]
pub struct CredentialArgs {
    /// Cloud access key id (default: $AWS_ACCESS_KEY_ID)
    #[arg(long, value_name = "ID")]
    pub access_key_id: Option<String>,

    /// Cloud secret access key (default: $AWS_SECRET_ACCESS_KEY)
    #[arg(long, value_name = "KEY")]
    pub secret_access_key: Option<String>,

    /// Cloud session token (default: $AWS_SESSION_TOKEN)
    #[arg(long, value_name = "TOKEN")]
    pub session_token: Option<String>,

    /// File of `export KEY=value` lines as copied from a cloud console, `-` for stdin
    #[arg(long, value_name = "PATH")]
    pub credentials_file: Option<PathBuf>,
}

impl CredentialArgs {
    fn any_flag(&self) -> bool {
        self.access_key_id.is_some()
            || self.secret_access_key.is_some()
            || self.session_token.is_some()
            || self.credentials_file.is_some()
    }

    /// Credentials from the flags, or from the CLI's own environment when
    /// no flag is given.
    pub fn resolve(self) -> Result<Credentials> {
        if !self.any_flag() {
            return Ok(Credentials {
                access_key_id: crate::env::aws_access_key_id(),
                secret_access_key: crate::env::aws_secret_access_key(),
                session_token: crate::env::aws_session_token(),
                export_block: None,
            });
        }
        let export_block = self
            .credentials_file
            .as_deref()
            .map(read_export_block)
            .transpose()?;
        Ok(Credentials {
            access_key_id: self.access_key_id,
            secret_access_key: self.secret_access_key,
            session_token: self.session_token,
            export_block,
        })
    }
}

fn read_export_block(path: &std::path::Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut block = String::new();
        std::io::stdin()
            .read_to_string(&mut block)
            .context("failed to read credentials from stdin")?;
        return Ok(block);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read credentials file {}", path.display()))
}

#[derive(Args, Debug, Default)]
pub struct ClusterArgs {
    /// Cluster name
    #[arg(long, value_name = "NAME", requires = "region")]
    pub cluster: Option<String>,

    /// Cloud region of the cluster
    #[arg(long, value_name = "REGION", requires = "cluster")]
    pub region: Option<String>,

    /// Named cloud CLI profile
    #[arg(long, value_name = "PROFILE", requires = "cluster")]
    pub profile: Option<String>,
}

impl ClusterArgs {
    pub fn target(self) -> Option<ClusterTarget> {
        let (cluster, region) = self.cluster.zip(self.region)?;
        let target = ClusterTarget::new(cluster, region);
        Some(match self.profile {
            Some(profile) => target.with_profile(profile),
            None => target,
        })
    }
}

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;
