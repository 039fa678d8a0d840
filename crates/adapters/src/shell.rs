// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Locating the hosting shell

use std::path::{Path, PathBuf};

use crate::subprocess::ProcessError;

/// Shells tried in order when none is configured
pub const SHELL_CANDIDATES: &[&str] = &["bash", "sh"];

/// A shell able to run a command line via `-c`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    program: PathBuf,
}

impl Shell {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Resolve `preferred` if given, otherwise the first available candidate.
    pub fn detect(preferred: Option<&str>) -> Result<Self, ProcessError> {
        if let Some(name) = preferred {
            return which::which(name)
                .map(Self::new)
                .map_err(|_| ProcessError::ShellNotFound(name.to_string()));
        }
        SHELL_CANDIDATES
            .iter()
            .find_map(|name| which::which(name).ok())
            .map(Self::new)
            .ok_or_else(|| ProcessError::ShellNotFound(SHELL_CANDIDATES.join(", ")))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
