// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity verdicts from captured CLI output.
//!
//! The cluster CLI's exit code is not a reliable reachability signal across
//! versions, so the verdict comes from markers in stdout. This is a
//! heuristic and is kept behind [`ProbePolicy`] so a structured parser can
//! replace it without touching execution.

/// Pure verdicts over captured text
pub trait ProbePolicy: Send + Sync + 'static {
    /// Whether `cluster-info` output shows a reachable control plane
    fn reachable(&self, cluster_info: &str) -> bool;

    /// Whether permission-check output grants access
    fn permitted(&self, can_i: &str) -> bool;
}

/// Substring markers as printed by `kubectl`
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerPolicy;

const CONTROL_PLANE_MARKERS: &[&str] = &["kubernetes control plane", "kubernetes master"];
const DENIED_MARKER: &str = "forbidden";

impl ProbePolicy for MarkerPolicy {
    fn reachable(&self, cluster_info: &str) -> bool {
        let lower = cluster_info.to_lowercase();
        CONTROL_PLANE_MARKERS.iter().any(|m| lower.contains(m))
    }

    /// A line opening with `yes` grants; `no` or a forbidden error denies.
    /// Anything else is given the benefit of the doubt.
    fn permitted(&self, can_i: &str) -> bool {
        let mut saw_yes = false;
        for word in can_i.lines().filter_map(|l| l.split_whitespace().next()) {
            if word.eq_ignore_ascii_case("no") {
                return false;
            }
            if word.eq_ignore_ascii_case("yes") {
                saw_yes = true;
            }
        }
        saw_yes || !can_i.to_lowercase().contains(DENIED_MARKER)
    }
}

/// The fixed diagnostic chain
pub(crate) const CLUSTER_INFO: &[&str] = &["cluster-info"];
pub(crate) const CURRENT_CONTEXT: &[&str] = &["config", "current-context"];
pub(crate) const PERMISSION_CHECK: &[&str] = &["auth", "can-i", "get", "pods"];

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
