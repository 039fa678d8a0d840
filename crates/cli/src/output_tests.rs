// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{failure, format_time_ago, truncate};
use yare::parameterized;

#[test]
fn failure_without_details_is_just_the_message() {
    let err = failure("Cluster not found", None);
    assert_eq!(err.code, 1);
    assert_eq!(err.message, "Cluster not found");
}

#[test]
fn failure_skips_details_that_repeat_the_message() {
    let err = failure("No running process with id p-1", Some("No running process with id p-1\n"));
    assert_eq!(err.message, "No running process with id p-1");
}

#[test]
fn failure_indents_multiline_details() {
    let err = failure(
        "Permission denied",
        Some("Error from server (Forbidden):\npods is forbidden"),
    );
    assert_eq!(
        err.message,
        "Permission denied\n\nDetails:\n    Error from server (Forbidden):\n    pods is forbidden"
    );
}

#[parameterized(
    short = { "default", 10, "default" },
    exact = { "0123456789", 10, "0123456789" },
    cut = { "kubectl get pods --all-namespaces", 12, "kubectl g..." },
    multibyte = { "héllo wörld!", 8, "héllo..." },
)]
fn truncation(input: &str, max: usize, expected: &str) {
    assert_eq!(truncate(input, max), expected);
}

#[test]
fn unknown_timestamp_renders_as_dash() {
    assert_eq!(format_time_ago(0), "-");
}
