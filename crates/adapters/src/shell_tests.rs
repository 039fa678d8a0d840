// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn detect_finds_a_default_shell() {
    let shell = Shell::detect(None).unwrap();
    assert!(shell.program().is_absolute(), "{:?}", shell);
}

#[test]
fn detect_preferred_sh() {
    let shell = Shell::detect(Some("sh")).unwrap();
    assert!(shell.program().ends_with("sh"));
}

#[test]
fn detect_missing_preferred_is_an_error() {
    let err = Shell::detect(Some("definitely-not-a-shell-xyz")).unwrap_err();
    assert!(matches!(err, ProcessError::ShellNotFound(ref name) if name == "definitely-not-a-shell-xyz"));
}
