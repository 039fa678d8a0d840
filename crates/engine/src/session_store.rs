// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrent session store.
//!
//! Every operation takes the lock once and completes under it, so two
//! callers resolving the same id never observe each other half-way.

use std::collections::HashMap;
use std::time::Duration;

use cg_core::{Clock, ClusterTarget, Credentials, IdGen, Session, SessionId, SessionSummary};
use parking_lot::Mutex;

pub struct SessionStore<C: Clock, G: IdGen> {
    sessions: Mutex<HashMap<SessionId, Session>>,
    clock: C,
    ids: G,
}

impl<C: Clock, G: IdGen> SessionStore<C, G> {
    pub fn new(clock: C, ids: G) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            clock,
            ids,
        }
    }

    /// Reuse the session named by `id` if it exists, otherwise create one
    /// from `target` and `credentials` under a fresh id.
    ///
    /// Reuse only refreshes `last_activity_ms`; the stored cluster identity
    /// and credentials win over whatever the caller passed.
    pub fn resolve(
        &self,
        id: Option<&SessionId>,
        target: &ClusterTarget,
        credentials: &Credentials,
    ) -> Session {
        let now = self.clock.epoch_ms();
        let mut sessions = self.sessions.lock();

        if let Some(existing) = id.and_then(|id| sessions.get_mut(id.as_str())) {
            touch(existing, now);
            return existing.clone();
        }

        let mut new_id = SessionId::new(self.ids.next());
        while sessions.contains_key(new_id.as_str()) {
            new_id = SessionId::new(self.ids.next());
        }
        let session = Session {
            id: new_id.clone(),
            target: target.clone(),
            credentials: credentials.clone(),
            last_activity_ms: now,
            created_at_ms: now,
        };
        sessions.insert(new_id, session.clone());
        tracing::info!(
            session_id = %session.id,
            cluster = %session.target.cluster_name,
            region = %session.target.region,
            "session created"
        );
        session
    }

    /// Refresh and return an existing session
    pub fn touch(&self, id: &SessionId) -> Option<Session> {
        let now = self.clock.epoch_ms();
        let mut sessions = self.sessions.lock();
        let session = sessions.get_mut(id.as_str())?;
        touch(session, now);
        Some(session.clone())
    }

    pub(crate) fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Summaries ordered by creation time
    pub fn list(&self) -> Vec<SessionSummary> {
        let mut list: Vec<_> = self.sessions.lock().values().map(Session::summary).collect();
        list.sort_by(|a, b| {
            a.created_at_ms
                .cmp(&b.created_at_ms)
                .then_with(|| a.id.cmp(&b.id))
        });
        list
    }

    /// Remove sessions idle for longer than `ttl`, returning their ids
    pub fn evict_idle(&self, ttl: Duration) -> Vec<SessionId> {
        let now = self.clock.epoch_ms();
        let ttl_ms = ttl.as_millis() as u64;
        let mut evicted = Vec::new();
        self.sessions.lock().retain(|id, session| {
            let idle = now.saturating_sub(session.last_activity_ms);
            let keep = idle <= ttl_ms;
            if !keep {
                evicted.push(id.clone());
            }
            keep
        });
        evicted
    }
}

/// `last_activity_ms` strictly increases even when the clock does not
fn touch(session: &mut Session, now: u64) {
    session.last_activity_ms = now.max(session.last_activity_ms + 1);
}

#[cfg(test)]
#[path = "session_store_tests.rs"]
mod tests;
