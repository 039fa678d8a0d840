// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment composition: turning a session and a command into a shell line.
//!
//! A [`ShellLine`] is structured: environment variables travel through the
//! child's environment and never appear in the command text, generated steps
//! are argv vectors rendered with single-quote escaping, and only the
//! operator's own command is passed through verbatim. Steps are chained with
//! `&&` so a failed credential or context step stops everything after it.

use std::path::{Path, PathBuf};

use cg_adapters::ProcessSpec;
use cg_core::{redact, ClusterTarget, Session, SessionId};
use thiserror::Error;

/// Longest identifier accepted for interpolation (DNS name limit)
pub const MAX_IDENTIFIER_LEN: usize = 253;

/// Namespace that needs no `-n` flag
pub const DEFAULT_NAMESPACE: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error("invalid {field} {value:?}: allowed are letters, digits and ._:/@+- (1-253 chars)")]
    InvalidValue { field: &'static str, value: String },
    #[error("invalid environment variable name {0:?}")]
    InvalidEnvKey(String),
    #[error("value of {0} contains a NUL byte")]
    NulInValue(String),
    #[error("credential block line {line} is not a KEY=value assignment")]
    InvalidExportLine { line: usize },
    #[error("command is empty")]
    EmptyCommand,
}

/// One `&&`-chained element of a shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A generated invocation; every element is quoted when rendered
    Argv(Vec<String>),
    /// The operator's command, rendered verbatim
    Script(String),
}

impl Step {
    /// `chained` steps share a line with others. An operator script then
    /// runs as one brace group, so `;`, `||`, `&` or newlines inside it
    /// stay behind the preceding `&&`.
    fn render(&self, chained: bool) -> String {
        match self {
            Step::Argv(args) => args.iter().map(|a| quote(a)).collect::<Vec<_>>().join(" "),
            Step::Script(script) if chained => format!("{{ {}\n}}", script.trim_end()),
            Step::Script(script) => script.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellLine {
    env: Vec<(String, String)>,
    steps: Vec<Step>,
}

/// Env keys whose values are shown unredacted in logs and listings
const PLAIN_ENV_KEYS: &[&str] = &[
    "AWS_PROFILE",
    "AWS_REGION",
    "AWS_DEFAULT_REGION",
    "AWS_PAGER",
    "KUBECONFIG",
];

impl ShellLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an environment variable, replacing an earlier value for the key
    pub fn push_env(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), ComposeError> {
        let key = key.into();
        let value = value.into();
        validate_env_key(&key)?;
        if value.contains('\0') {
            return Err(ComposeError::NulInValue(key));
        }
        match self.env.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.env.push((key, value)),
        }
        Ok(())
    }

    pub fn push_argv<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps
            .push(Step::Argv(args.into_iter().map(Into::into).collect()));
    }

    pub fn push_script(&mut self, script: impl Into<String>) {
        self.steps.push(Step::Script(script.into()));
    }

    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    /// Command text handed to `sh -c`
    pub fn render(&self) -> String {
        let chained = self.steps.len() > 1;
        self.steps
            .iter()
            .map(|step| step.render(chained))
            .collect::<Vec<_>>()
            .join(" && ")
    }

    /// Log-safe form: env values redacted, followed by the command text
    pub fn redacted(&self) -> String {
        if self.env.is_empty() {
            return self.render();
        }
        let env = self
            .env
            .iter()
            .map(|(k, v)| {
                if PLAIN_ENV_KEYS.contains(&k.as_str()) {
                    format!("{k}={v}")
                } else {
                    format!("{k}={}", redact(v))
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        format!("[{env}] {}", self.render())
    }

    pub fn to_spec(&self) -> ProcessSpec {
        ProcessSpec {
            line: self.render(),
            env: self.env.clone(),
        }
    }
}

/// POSIX single-quote escaping. Plain words are left bare for readability.
pub fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:@%+=,".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Enforce the interpolation allow-list for cluster names, regions,
/// profiles and namespaces.
pub fn validate_identifier(field: &'static str, value: &str) -> Result<(), ComposeError> {
    let ok = (1..=MAX_IDENTIFIER_LEN).contains(&value.len())
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._:/@+-".contains(c));
    if ok {
        Ok(())
    } else {
        Err(ComposeError::InvalidValue {
            field,
            value: value.to_string(),
        })
    }
}

/// Check every interpolated field of a cluster target
pub fn validate_target(target: &ClusterTarget) -> Result<(), ComposeError> {
    validate_identifier("cluster name", &target.cluster_name)?;
    validate_identifier("region", &target.region)?;
    if let Some(profile) = &target.profile {
        validate_identifier("profile", profile)?;
    }
    Ok(())
}

fn validate_env_key(key: &str) -> Result<(), ComposeError> {
    let mut chars = key.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ComposeError::InvalidEnvKey(key.to_string()))
    }
}

/// Parse a pasted credential block into variables.
///
/// Accepts the shapes cloud consoles hand out: `export KEY=value` (sh),
/// `set KEY=value` (cmd) and `$Env:KEY="value"` (PowerShell), as well as
/// bare `KEY=value`. Blank lines and `#` comments are skipped; matching
/// outer quotes are removed from values.
pub fn parse_export_block(block: &str) -> Result<Vec<(String, String)>, ComposeError> {
    let mut vars = Vec::new();
    for (index, raw) in block.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let statement = strip_keyword(line);
        let (key, value) = statement
            .split_once('=')
            .ok_or(ComposeError::InvalidExportLine { line: index + 1 })?;
        let key = key.trim();
        validate_env_key(key)?;
        vars.push((key.to_string(), unquote(value.trim()).to_string()));
    }
    Ok(vars)
}

fn strip_keyword(line: &str) -> &str {
    for keyword in ["export ", "set ", "$env:"] {
        let matched = line
            .get(..keyword.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(keyword));
        if matched {
            return line[keyword.len()..].trim_start();
        }
    }
    line
}

fn unquote(value: &str) -> &str {
    for q in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(q) && value.ends_with(q) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Builds shell lines for server and cluster mode
#[derive(Debug, Clone)]
pub struct Composer {
    cloud_cli: String,
    cluster_cli: String,
    kube_dir: Option<PathBuf>,
}

impl Composer {
    /// `kube_dir` enables per-session KUBECONFIG files
    pub fn new(
        cloud_cli: impl Into<String>,
        cluster_cli: impl Into<String>,
        kube_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            cloud_cli: cloud_cli.into(),
            cluster_cli: cluster_cli.into(),
            kube_dir,
        }
    }

    pub fn cluster_cli(&self) -> &str {
        &self.cluster_cli
    }

    pub fn kube_dir(&self) -> Option<&Path> {
        self.kube_dir.as_deref()
    }

    pub fn kubeconfig_path(&self, id: &SessionId) -> Option<PathBuf> {
        self.kube_dir.as_ref().map(|dir| dir.join(id.as_str()))
    }

    /// Server mode: the classified command, nothing else
    pub fn server_line(&self, command: &str) -> ShellLine {
        let mut line = ShellLine::new();
        line.push_script(command);
        line
    }

    /// Prefix the cluster CLI when missing and scope to `namespace`.
    ///
    /// `get pods` with namespace `team-a` becomes `kubectl -n team-a get pods`.
    /// Commands for the cloud CLI itself pass through untouched.
    pub fn scope_cluster_command(
        &self,
        command: &str,
        namespace: Option<&str>,
    ) -> Result<String, ComposeError> {
        let command = command.trim();
        let tokens: Vec<&str> = command.split_whitespace().collect();
        let Some(first) = tokens.first().copied() else {
            return Err(ComposeError::EmptyCommand);
        };

        let namespace = namespace
            .map(str::trim)
            .filter(|ns| !ns.is_empty() && *ns != DEFAULT_NAMESPACE);
        if let Some(ns) = namespace {
            validate_identifier("namespace", ns)?;
        }

        if same_program(first, &self.cloud_cli) {
            return Ok(command.to_string());
        }

        let (program, rest) = if same_program(first, &self.cluster_cli) {
            (first.to_string(), command[first.len()..].trim_start())
        } else {
            (quote(&self.cluster_cli), command)
        };

        let scoped = match namespace {
            Some(ns) if !has_namespace_flag(&tokens) => format!("{program} -n {ns} {rest}"),
            _ => format!("{program} {rest}"),
        };
        Ok(scoped.trim_end().to_string())
    }

    /// Environment for a session: credentials, profile, region, kubeconfig
    pub fn session_env(&self, session: &Session) -> Result<ShellLine, ComposeError> {
        let target = &session.target;
        validate_target(target)?;

        let mut line = ShellLine::new();
        let creds = &session.credentials;
        if let Some(v) = &creds.access_key_id {
            line.push_env("AWS_ACCESS_KEY_ID", v)?;
        }
        if let Some(v) = &creds.secret_access_key {
            line.push_env("AWS_SECRET_ACCESS_KEY", v)?;
        }
        if let Some(v) = &creds.session_token {
            line.push_env("AWS_SESSION_TOKEN", v)?;
        }
        if let Some(block) = &creds.export_block {
            for (key, value) in parse_export_block(block)? {
                line.push_env(key, value)?;
            }
        }
        if let Some(profile) = &target.profile {
            line.push_env("AWS_PROFILE", profile)?;
        }
        line.push_env("AWS_REGION", &target.region)?;
        line.push_env("AWS_DEFAULT_REGION", &target.region)?;
        line.push_env("AWS_PAGER", "")?;
        if let Some(path) = self.kubeconfig_path(&session.id) {
            line.push_env("KUBECONFIG", path.to_string_lossy())?;
        }
        Ok(line)
    }

    /// Cluster-context activation for the session's target
    pub fn push_activation(&self, line: &mut ShellLine, session: &Session) {
        let target = &session.target;
        line.push_argv([
            self.cloud_cli.as_str(),
            "eks",
            "update-kubeconfig",
            "--name",
            target.cluster_name.as_str(),
            "--region",
            target.region.as_str(),
        ]);
    }

    /// Cluster mode: credentials, then context activation, then the command
    pub fn cluster_line(&self, session: &Session, command: &str) -> Result<ShellLine, ComposeError> {
        let mut line = self.session_env(session)?;
        self.push_activation(&mut line, session);
        line.push_script(command);
        Ok(line)
    }
}

fn same_program(token: &str, configured: &str) -> bool {
    fn name(s: &str) -> &str {
        s.rsplit('/').next().unwrap_or(s)
    }
    token == configured || name(token) == name(configured)
}

fn has_namespace_flag(tokens: &[&str]) -> bool {
    tokens.iter().any(|t| {
        matches!(*t, "-n" | "--namespace" | "-A" | "--all-namespaces")
            || t.starts_with("--namespace=")
    })
}

#[cfg(test)]
#[path = "compose_tests.rs"]
mod tests;
