//! Daemon log specs

use crate::prelude::*;

#[test]
fn logs_without_a_log_file() {
    let gw = Gateway::new();
    gw.cg()
        .args(&["daemon", "logs"])
        .passes()
        .stdout_has("No log file found");
}

#[test]
fn logs_show_startup_and_ready_lines() {
    let gw = Gateway::new();
    gw.cg().args(&["daemon", "start"]).passes();
    gw.cg()
        .args(&["daemon", "logs", "--no-limit"])
        .passes()
        .stdout_has("--- cgd: starting (pid: ")
        .stdout_has("Daemon ready");
}

#[test]
fn logs_limit_keeps_the_tail() {
    let gw = Gateway::new();
    gw.cg().args(&["daemon", "start"]).passes();
    let run = gw.cg().args(&["daemon", "logs", "-n", "1"]).passes();
    assert_eq!(run.stdout().lines().count(), 1);
}

#[test]
fn secrets_never_reach_the_log() {
    let gw = Gateway::new();
    gw.config("shell = \"sh\"\ncloud_cli = \"true\"\ncluster_cli = \"true\"\n");
    gw.cg()
        .args(&["exec", "--cluster", "demo", "--region", "us-east-1"])
        .args(&["--access-key-id", "AKIASECRETVALUE", "--secret-access-key", "wJalrXUtnFEMI"])
        .args(&["get", "pods"])
        .passes();
    let log = gw.daemon_log();
    assert!(!log.contains("AKIASECRETVALUE"), "{log}");
    assert!(!log.contains("wJalrXUtnFEMI"), "{log}");
}
