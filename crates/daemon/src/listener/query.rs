// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only request handlers.

use std::time::Instant;

use cg_engine::Gateway;

use crate::protocol::Response;

pub(super) fn status(gateway: &Gateway, start_time: Instant) -> Response {
    Response::Status {
        uptime_secs: start_time.elapsed().as_secs(),
        sessions_active: gateway.session_count(),
        processes_active: gateway.process_count(),
    }
}

pub(super) fn sessions(gateway: &Gateway) -> Response {
    Response::Sessions {
        sessions: gateway.sessions(),
    }
}

pub(super) fn processes(gateway: &Gateway) -> Response {
    Response::Processes {
        processes: gateway.processes(),
    }
}
