//! Error reporting specs

use crate::prelude::*;

#[test]
fn listings_do_not_start_the_daemon() {
    let gw = Gateway::new();
    gw.cg()
        .args(&["session", "list"])
        .fails()
        .stderr_has("Error: Daemon not running");
    assert!(gw.daemon_pid().is_none());
}

#[test]
fn cancel_needs_a_running_daemon() {
    let gw = Gateway::new();
    gw.cg()
        .args(&["cancel", "nothing"])
        .fails()
        .stderr_has("Daemon not running");
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    let gw = Gateway::new();
    let run = gw.cg().args(&["reboot"]).fails();
    assert_eq!(run.code(), Some(2));
}

#[test]
fn region_requires_a_cluster() {
    let gw = Gateway::new();
    gw.cg()
        .args(&["exec", "--region", "us-east-1", "ls"])
        .fails()
        .stderr_has("--cluster");
}
