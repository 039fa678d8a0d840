// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Command gateway engine: classification, composition, supervised
//! execution, cancellation and connectivity probing

pub mod classifier;
pub mod compose;
pub mod config;
pub mod diagnose;
mod executor;
mod gateway;
pub mod probe;
mod registry;
mod session_store;
pub mod timeout_policy;

pub use classifier::{has_timeout_directive, Classification, Classifier};
pub use compose::{ComposeError, Composer, ShellLine};
pub use config::{ConfigError, GatewayConfig};
pub use diagnose::{categorize, diagnose, Diagnosis, ErrorCategory};
pub use executor::{Executor, ExecutorTiming};
pub use gateway::{Gateway, GatewayDeps, GatewayError, SweepReport};
pub use probe::{MarkerPolicy, ProbePolicy};
pub use registry::{CancelHandle, CancelRequest, ProcessRegistry, Registration, RegistryError};
pub use session_store::SessionStore;
pub use timeout_policy::{Intent, PolicyEntry};
