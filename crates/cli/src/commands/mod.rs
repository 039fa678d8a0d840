// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod cancel;
pub mod daemon;
pub mod exec;
pub mod probe;
pub mod process;
pub mod session;
mod target;
