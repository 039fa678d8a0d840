// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The command gateway: `execute`, `cancel` and `probe`.
//!
//! None of the three operations returns an error. Every failure becomes a
//! report with `success = false`, a human message and the raw text.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use cg_adapters::{ProcessError, Shell};
use cg_core::{
    floor_duration, format_duration_ms, CancelReport, Clock, ClusterTarget, Credentials,
    ExecuteReport, ExecuteRequest, ExecutionResult, ExitState, IdGen, Mode, ProbeReport,
    ProbeRequest, ProcessId, ProcessSummary, Session, SessionId, SessionSummary, SystemClock,
    UuidIdGen, TIMEOUT_EXIT_CODE,
};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::Instrument;

use crate::classifier::{Classification, Classifier};
use crate::compose::{validate_target, ComposeError, Composer, ShellLine};
use crate::config::GatewayConfig;
use crate::diagnose::diagnose;
use crate::executor::{Executor, ExecutorTiming};
use crate::probe::{MarkerPolicy, ProbePolicy, CLUSTER_INFO, CURRENT_CONTEXT, PERMISSION_CHECK};
use crate::registry::{CancelRequest, ProcessRegistry, RegistryError};
use crate::session_store::SessionStore;

/// Failures before or around execution. Never surfaced as `Err` to callers.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("cluster mode requires a cluster name and region, or a known session id")]
    MissingTarget,
    #[error("failed to prepare kubeconfig directory: {0}")]
    KubeDir(#[source] std::io::Error),
}

impl GatewayError {
    /// Message and raw text for a report
    fn describe(&self) -> (String, String) {
        let raw = self.to_string();
        match self {
            // Caller mistakes: the error itself is the clearest message
            GatewayError::Compose(_) | GatewayError::Registry(_) | GatewayError::MissingTarget => {
                (raw.clone(), raw)
            }
            GatewayError::Process(_) | GatewayError::KubeDir(_) => (diagnose(&*raw).message, raw),
        }
    }
}

/// Injected collaborators
pub struct GatewayDeps<C: Clock, G: IdGen> {
    pub clock: C,
    pub ids: G,
    pub shell: Shell,
    /// Parent directory for per-session kubeconfig files
    pub kube_dir: Option<PathBuf>,
    pub policy: Arc<dyn ProbePolicy>,
}

impl GatewayDeps<SystemClock, UuidIdGen> {
    /// Production collaborators; fails when no shell can be found
    pub fn system(config: &GatewayConfig, kube_dir: Option<PathBuf>) -> Result<Self, ProcessError> {
        Ok(Self {
            clock: SystemClock,
            ids: UuidIdGen::default(),
            shell: Shell::detect(config.shell.as_deref())?,
            kube_dir,
            policy: Arc::new(MarkerPolicy),
        })
    }
}

/// Result of one eviction sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub evicted_sessions: usize,
    pub orphaned_processes: usize,
}

struct Inner<C: Clock, G: IdGen> {
    config: GatewayConfig,
    classifier: Classifier,
    composer: Composer,
    executor: Executor,
    sessions: SessionStore<C, G>,
    registry: ProcessRegistry<C>,
    policy: Arc<dyn ProbePolicy>,
}

/// Shared handle; clones refer to the same stores
pub struct Gateway<C: Clock = SystemClock, G: IdGen = UuidIdGen> {
    inner: Arc<Inner<C, G>>,
}

impl<C: Clock, G: IdGen> Clone for Gateway<C, G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// A command ready to run
struct Prepared {
    line: ShellLine,
    classification: Classification,
    session_id: Option<SessionId>,
}

impl<C: Clock, G: IdGen> Gateway<C, G> {
    pub fn new(config: GatewayConfig, deps: GatewayDeps<C, G>) -> Self {
        let kube_dir = deps.kube_dir.filter(|_| config.isolate_kubeconfig);
        let inner = Inner {
            classifier: Classifier::new(config.ceiling(), config.advisory_margin()),
            composer: Composer::new(&config.cloud_cli, &config.cluster_cli, kube_dir),
            executor: Executor::new(
                deps.shell,
                ExecutorTiming {
                    kill_grace: config.kill_grace(),
                    drain: config.drain(),
                    floor: config.duration_floor(),
                },
            ),
            sessions: SessionStore::new(deps.clock.clone(), deps.ids),
            registry: ProcessRegistry::new(deps.clock),
            policy: deps.policy,
            config,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    pub fn sessions(&self) -> Vec<SessionSummary> {
        self.inner.sessions.list()
    }

    pub fn session_count(&self) -> usize {
        self.inner.sessions.len()
    }

    pub fn processes(&self) -> Vec<ProcessSummary> {
        self.inner.registry.list()
    }

    pub fn process_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Run a command in server or cluster mode
    pub async fn execute(&self, request: ExecuteRequest) -> ExecuteReport {
        let span = tracing::info_span!(
            "gateway.execute",
            mode = %request.mode,
            process_id = request.process_id.as_ref().map(|p| p.as_str()),
            session_id = request.session_id.as_ref().map(|s| s.as_str()),
        );
        self.execute_inner(request).instrument(span).await
    }

    async fn execute_inner(&self, request: ExecuteRequest) -> ExecuteReport {
        let started = Instant::now();
        let prepared = match self.prepare(&request).await {
            Ok(prepared) => prepared,
            Err(e) => return self.failed(&e, request.session_id, started),
        };
        tracing::info!(
            command = %prepared.line.redacted(),
            deadline_ms = prepared.classification.deadline.as_millis() as u64,
            wrapped = prepared.classification.wrapped,
            "executing"
        );

        let outcome = match &request.process_id {
            Some(process_id) => self.run_tracked(process_id, &prepared).await,
            None => self
                .inner
                .executor
                .run(&prepared.line.to_spec(), prepared.classification.deadline)
                .await
                .map_err(GatewayError::from),
        };

        match outcome {
            Ok(result) => self.report(&result, prepared),
            Err(e) => self.failed(&e, prepared.session_id, started),
        }
    }

    async fn prepare(&self, request: &ExecuteRequest) -> Result<Prepared, GatewayError> {
        let inner = &self.inner;
        if request.command.trim().is_empty() {
            return Err(ComposeError::EmptyCommand.into());
        }
        match request.mode {
            Mode::Server => {
                let classification = inner.classifier.classify(&request.command);
                Ok(Prepared {
                    line: inner.composer.server_line(&classification.command),
                    classification,
                    session_id: None,
                })
            }
            Mode::Cluster => {
                let session = self.resolve_session(
                    request.session_id.as_ref(),
                    request.cluster.as_ref(),
                    &request.credentials,
                )?;
                let scoped = inner
                    .composer
                    .scope_cluster_command(&request.command, request.namespace.as_deref())?;
                let classification = inner.classifier.classify(&scoped);
                let line = inner.composer.cluster_line(&session, &classification.command)?;
                self.ensure_kube_dir().await?;
                Ok(Prepared {
                    line,
                    classification,
                    session_id: Some(session.id),
                })
            }
        }
    }

    fn resolve_session(
        &self,
        id: Option<&SessionId>,
        target: Option<&ClusterTarget>,
        credentials: &Credentials,
    ) -> Result<Session, GatewayError> {
        let sessions = &self.inner.sessions;
        match (id, target) {
            (id, Some(target)) => {
                validate_target(target)?;
                Ok(sessions.resolve(id, target, credentials))
            }
            (Some(id), None) => sessions.touch(id).ok_or(GatewayError::MissingTarget),
            (None, None) => Err(GatewayError::MissingTarget),
        }
    }

    async fn ensure_kube_dir(&self) -> Result<(), GatewayError> {
        if let Some(dir) = self.inner.composer.kube_dir() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(GatewayError::KubeDir)?;
        }
        Ok(())
    }

    /// Reserve, spawn, supervise, release. The entry is released on every
    /// path out of here; a dropped future leaves an entry the sweep removes.
    async fn run_tracked(
        &self,
        process_id: &ProcessId,
        prepared: &Prepared,
    ) -> Result<ExecutionResult, GatewayError> {
        let inner = &self.inner;
        let mut registration = inner
            .registry
            .reserve(process_id, prepared.line.redacted())?;
        let process = match inner.executor.spawn(&prepared.line.to_spec()) {
            Ok(process) => process,
            Err(e) => {
                inner.registry.release(&registration);
                return Err(e.into());
            }
        };
        inner.registry.set_pid(&registration, process.handle.pid());

        let result = inner
            .executor
            .supervise(
                process,
                prepared.classification.deadline,
                Some(&mut registration.control),
            )
            .await;
        inner.registry.release(&registration);
        result.map_err(GatewayError::from)
    }

    fn report(&self, result: &ExecutionResult, prepared: Prepared) -> ExecuteReport {
        let classification = &prepared.classification;
        let success = result.is_success(classification.has_timeout_directive);
        let (message, error) = if success {
            let message = match result.exit {
                ExitState::Exited {
                    code: TIMEOUT_EXIT_CODE,
                } => match classification.advisory {
                    Some(limit) => format!(
                        "Command reached its {} time limit",
                        format_duration_ms(limit.as_millis() as u64)
                    ),
                    None => "Command reached its time limit".to_string(),
                },
                _ => "Command completed successfully".to_string(),
            };
            (message, None)
        } else {
            let raw = match result.exit {
                ExitState::TimedOut => format!(
                    "command timed out after {}",
                    format_duration_ms(classification.deadline.as_millis() as u64)
                ),
                ExitState::Killed => "command was cancelled".to_string(),
                ExitState::Signaled { signal } => {
                    failure_text(result, &format!("command terminated by signal {signal}"))
                }
                ExitState::Exited { code } => {
                    failure_text(result, &format!("command exited with code {code}"))
                }
            };
            let message = match result.exit {
                ExitState::Killed => "Command was cancelled".to_string(),
                _ => diagnose(&*raw).message,
            };
            (message, Some(raw))
        };

        tracing::info!(
            success,
            state = %result.state(),
            duration_ms = result.elapsed.as_millis() as u64,
            "execute finished"
        );
        ExecuteReport {
            success,
            message,
            output: result.combined_output(),
            error,
            duration_ms: result.elapsed.as_millis() as u64,
            session_id: prepared.session_id,
        }
    }

    fn failed(
        &self,
        error: &GatewayError,
        session_id: Option<SessionId>,
        started: Instant,
    ) -> ExecuteReport {
        let (message, raw) = error.describe();
        tracing::warn!(error = %raw, "execute failed before completion");
        ExecuteReport {
            success: false,
            message,
            output: String::new(),
            error: Some(raw),
            duration_ms: self.floored_ms(started),
            session_id,
        }
    }

    fn floored_ms(&self, started: Instant) -> u64 {
        floor_duration(started.elapsed(), self.inner.config.duration_floor()).as_millis() as u64
    }

    /// Terminate a tracked execution and return what it printed
    pub async fn cancel(&self, process_id: &ProcessId) -> CancelReport {
        let span = tracing::info_span!("gateway.cancel", process_id = %process_id);
        self.cancel_inner(process_id).instrument(span).await
    }

    async fn cancel_inner(&self, process_id: &ProcessId) -> CancelReport {
        let started = Instant::now();
        let Some(handle) = self.inner.registry.take(process_id) else {
            tracing::info!("no such running process");
            return CancelReport {
                success: false,
                message: format!("No running process with id {process_id}"),
                output: String::new(),
                duration_ms: self.floored_ms(started),
            };
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        if handle
            .control
            .send(CancelRequest { reply: reply_tx })
            .await
            .is_err()
        {
            return already_finished(process_id, self.floored_ms(handle.started_at));
        }

        let wait = self.inner.config.cancel_wait();
        match tokio::time::timeout(wait, reply_rx).await {
            Ok(Ok(result)) => {
                let message = match result.exit {
                    ExitState::Killed => format!("Process {process_id} cancelled"),
                    _ => format!("Process {process_id} finished before it could be cancelled"),
                };
                tracing::info!(state = %result.state(), "cancel finished");
                CancelReport {
                    success: true,
                    message,
                    output: result.combined_output(),
                    duration_ms: result.elapsed.as_millis() as u64,
                }
            }
            Ok(Err(_)) => already_finished(process_id, self.floored_ms(handle.started_at)),
            Err(_) => {
                tracing::warn!(wait_ms = wait.as_millis() as u64, "cancel not confirmed");
                CancelReport {
                    success: false,
                    message: format!(
                        "Process {process_id} did not confirm termination within {}",
                        format_duration_ms(wait.as_millis() as u64)
                    ),
                    output: String::new(),
                    duration_ms: self.floored_ms(handle.started_at),
                }
            }
        }
    }

    /// Cancel everything still running. Returns how many were signalled.
    pub async fn cancel_all(&self) -> usize {
        let handles = self.inner.registry.take_all();
        let mut replies = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            let (tx, rx) = oneshot::channel();
            if handle.control.send(CancelRequest { reply: tx }).await.is_ok() {
                replies.push((id, rx));
            }
        }
        let count = replies.len();
        let deadline = tokio::time::Instant::now() + self.inner.config.cancel_wait();
        for (id, rx) in replies {
            if tokio::time::timeout_at(deadline, rx).await.is_err() {
                tracing::warn!(process_id = %id, "process did not confirm termination");
            }
        }
        count
    }

    /// Check reachability and permissions for a cluster
    pub async fn probe(&self, request: ProbeRequest) -> ProbeReport {
        let span = tracing::info_span!(
            "gateway.probe",
            cluster = %request.target.cluster_name,
            region = %request.target.region,
        );
        async move {
            let started = Instant::now();
            let session_id = request.session_id.clone();
            match self.probe_inner(request).await {
                Ok(report) => report,
                Err(e) => {
                    let (message, raw) = e.describe();
                    tracing::warn!(error = %raw, "probe failed before completion");
                    ProbeReport {
                        success: false,
                        message,
                        output: raw,
                        has_permissions: false,
                        context: None,
                        duration_ms: self.floored_ms(started),
                        session_id,
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn probe_inner(&self, request: ProbeRequest) -> Result<ProbeReport, GatewayError> {
        let inner = &self.inner;
        let started = Instant::now();
        let session = self.resolve_session(
            request.session_id.as_ref(),
            Some(&request.target),
            &request.credentials,
        )?;
        self.ensure_kube_dir().await?;
        let deadline = inner.config.ceiling();

        // activate && cluster-info
        let mut line = inner.composer.session_env(&session)?;
        inner.composer.push_activation(&mut line, &session);
        line.push_argv(self.cluster_argv(CLUSTER_INFO));
        let info = inner.executor.run(&line.to_spec(), deadline).await?;
        let mut transcript = vec![info.combined_output()];

        if !inner.policy.reachable(&info.stdout) {
            let raw = failure_text(&info, "cluster control plane not reported");
            return Ok(ProbeReport {
                success: false,
                message: diagnose(&*raw).message,
                output: transcript.join("\n"),
                has_permissions: false,
                context: None,
                duration_ms: self.floored_ms(started),
                session_id: Some(session.id),
            });
        }

        let context = self.run_cluster_step(&session, CURRENT_CONTEXT, deadline).await?;
        transcript.push(context.combined_output());
        let context = Some(context.stdout.trim().to_string()).filter(|c| !c.is_empty());

        let can_i = self.run_cluster_step(&session, PERMISSION_CHECK, deadline).await?;
        transcript.push(can_i.combined_output());
        let has_permissions = inner.policy.permitted(&can_i.stdout);

        let name = &session.target.cluster_name;
        let message = if has_permissions {
            format!("Connected to cluster {name}")
        } else {
            format!("Connected to cluster {name}, but the credentials lack permission to list pods")
        };
        tracing::info!(has_permissions, context = ?context, "probe finished");
        Ok(ProbeReport {
            success: true,
            message,
            output: transcript.join("\n"),
            has_permissions,
            context,
            duration_ms: self.floored_ms(started),
            session_id: Some(session.id),
        })
    }

    async fn run_cluster_step(
        &self,
        session: &Session,
        args: &[&str],
        deadline: Duration,
    ) -> Result<ExecutionResult, GatewayError> {
        let mut line = self.inner.composer.session_env(session)?;
        line.push_argv(self.cluster_argv(args));
        Ok(self.inner.executor.run(&line.to_spec(), deadline).await?)
    }

    fn cluster_argv(&self, args: &[&str]) -> Vec<String> {
        let mut argv = vec![self.inner.composer.cluster_cli().to_string()];
        argv.extend(args.iter().map(|a| a.to_string()));
        argv
    }

    /// Evict idle sessions (and their kubeconfig files) and orphaned
    /// registry entries
    pub async fn sweep(&self) -> SweepReport {
        let inner = &self.inner;
        let evicted = inner.sessions.evict_idle(inner.config.session_ttl());
        for id in &evicted {
            let Some(path) = inner.composer.kubeconfig_path(id) else {
                continue;
            };
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(session_id = %id, error = %e, "failed to remove kubeconfig")
                }
            }
        }
        let report = SweepReport {
            evicted_sessions: evicted.len(),
            orphaned_processes: inner.registry.sweep_orphans(),
        };
        if report != SweepReport::default() {
            tracing::info!(
                evicted_sessions = report.evicted_sessions,
                orphaned_processes = report.orphaned_processes,
                "sweep"
            );
        }
        report
    }
}

/// Prefer stderr, then stdout, then a synthesized description
fn failure_text(result: &ExecutionResult, fallback: &str) -> String {
    let stderr = result.stderr.trim();
    let stdout = result.stdout.trim();
    if !stderr.is_empty() {
        stderr.to_string()
    } else if !stdout.is_empty() {
        stdout.to_string()
    } else {
        fallback.to_string()
    }
}

fn already_finished(process_id: &ProcessId, duration_ms: u64) -> CancelReport {
    CancelReport {
        success: false,
        message: format!("Process {process_id} already completed"),
        output: String::new(),
        duration_ms,
    }
}

#[cfg(test)]
#[path = "gateway_tests.rs"]
mod tests;
