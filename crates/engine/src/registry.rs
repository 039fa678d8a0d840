// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Active process registry.
//!
//! Maps a caller-supplied process id to the control channel of the task
//! supervising that process. Entries are reserved before spawn (so a
//! duplicate id is rejected without starting anything), and removed by
//! whichever side finishes first: a cancel takes the entry, or the
//! supervisor releases it on any terminal path. Each reservation carries a
//! token so a late release never removes a newer entry for the same id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use cg_core::{Clock, ExecutionResult, ProcessId, ProcessSummary};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("process id {0} is already running")]
    Duplicate(ProcessId),
}

/// Ask a supervisor to terminate its process and report the result
#[derive(Debug)]
pub struct CancelRequest {
    pub reply: oneshot::Sender<ExecutionResult>,
}

struct Entry {
    control: mpsc::Sender<CancelRequest>,
    token: u64,
    started_at: Instant,
    os_pid: Option<u32>,
    command: String,
}

/// Held by the supervising task for the lifetime of one tracked execution
#[derive(Debug)]
pub struct Registration {
    pub process_id: ProcessId,
    token: u64,
    pub control: mpsc::Receiver<CancelRequest>,
}

/// What a cancel gets after taking an entry
#[derive(Debug)]
pub struct CancelHandle {
    pub control: mpsc::Sender<CancelRequest>,
    pub started_at: Instant,
}

pub struct ProcessRegistry<C: Clock> {
    entries: Mutex<HashMap<ProcessId, Entry>>,
    next_token: AtomicU64,
    clock: C,
}

impl<C: Clock> ProcessRegistry<C> {
    pub fn new(clock: C) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
            clock,
        }
    }

    /// Claim `id` for a new execution. `command` is the log-safe form.
    pub fn reserve(
        &self,
        id: &ProcessId,
        command: impl Into<String>,
    ) -> Result<Registration, RegistryError> {
        let mut entries = self.entries.lock();
        if entries.contains_key(id.as_str()) {
            return Err(RegistryError::Duplicate(id.clone()));
        }
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(1);
        entries.insert(
            id.clone(),
            Entry {
                control: tx,
                token,
                started_at: self.clock.now(),
                os_pid: None,
                command: command.into(),
            },
        );
        Ok(Registration {
            process_id: id.clone(),
            token,
            control: rx,
        })
    }

    /// Record the OS pid once the process is spawned
    pub fn set_pid(&self, registration: &Registration, pid: Option<u32>) {
        if let Some(entry) = self.entries.lock().get_mut(registration.process_id.as_str()) {
            if entry.token == registration.token {
                entry.os_pid = pid;
            }
        }
    }

    /// Remove the entry for cancellation. `None` if not running.
    pub fn take(&self, id: &ProcessId) -> Option<CancelHandle> {
        self.entries
            .lock()
            .remove(id.as_str())
            .map(|entry| CancelHandle {
                control: entry.control,
                started_at: entry.started_at,
            })
    }

    /// Supervisor-side removal. A no-op when a cancel already took the
    /// entry or the id was reused since.
    pub fn release(&self, registration: &Registration) -> bool {
        let mut entries = self.entries.lock();
        let ours = entries
            .get(registration.process_id.as_str())
            .is_some_and(|e| e.token == registration.token);
        if ours {
            entries.remove(registration.process_id.as_str());
        }
        ours
    }

    /// Take every entry, for shutdown
    pub fn take_all(&self) -> Vec<(ProcessId, CancelHandle)> {
        self.entries
            .lock()
            .drain()
            .map(|(id, entry)| {
                (
                    id,
                    CancelHandle {
                        control: entry.control,
                        started_at: entry.started_at,
                    },
                )
            })
            .collect()
    }

    /// Drop entries whose supervisor is gone. Returns how many were removed.
    pub fn sweep_orphans(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|id, entry| {
            let alive = !entry.control.is_closed();
            if !alive {
                tracing::warn!(process_id = %id, "dropping orphaned registry entry");
            }
            alive
        });
        before - entries.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Live entries, oldest first
    pub fn list(&self) -> Vec<ProcessSummary> {
        let now = self.clock.now();
        let entries = self.entries.lock();
        let mut list: Vec<_> = entries
            .iter()
            .map(|(id, entry)| {
                (
                    entry.started_at,
                    ProcessSummary {
                        process_id: id.clone(),
                        command: entry.command.clone(),
                        elapsed_ms: now.saturating_duration_since(entry.started_at).as_millis()
                            as u64,
                        os_pid: entry.os_pid,
                    },
                )
            })
            .collect();
        list.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.process_id.cmp(&b.1.process_id)));
        list.into_iter().map(|(_, summary)| summary).collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
