//! Daemon lifecycle specs
//!
//! Verify daemon start/stop/status and startup error reporting.

use crate::prelude::*;

#[test]
fn status_reports_not_running_before_start() {
    let gw = Gateway::new();
    gw.cg()
        .args(&["daemon", "status"])
        .passes()
        .stdout_eq("Daemon not running\n");
}

#[test]
fn start_status_stop() {
    let gw = Gateway::new();
    gw.cg()
        .args(&["daemon", "start"])
        .passes()
        .stdout_eq("Daemon started\n");

    gw.cg()
        .args(&["daemon", "status"])
        .passes()
        .stdout_has("Status: running")
        .stdout_has("Sessions: 0 active")
        .stdout_has("Processes: 0 running");

    gw.cg()
        .args(&["daemon", "start"])
        .passes()
        .stdout_has("Daemon already running");

    gw.cg()
        .args(&["daemon", "stop"])
        .passes()
        .stdout_eq("Daemon stopped\n");
    gw.cg()
        .args(&["daemon", "status"])
        .passes()
        .stdout_eq("Daemon not running\n");

    assert!(!gw.state_path().join("daemon.sock").exists());
    assert!(!gw.state_path().join("daemon.pid").exists());
}

#[test]
fn status_json_has_counts() {
    let gw = Gateway::new();
    gw.cg().args(&["daemon", "start"]).passes();
    let run = gw.cg().args(&["-o", "json", "daemon", "status"]).passes();
    let status = run.json();
    assert_eq!(status["status"], "running");
    assert_eq!(status["sessions_active"], 0);
    assert_eq!(status["processes_active"], 0);
}

#[test]
fn version_matches_between_cli_and_daemon() {
    let gw = Gateway::new();
    gw.cg().args(&["daemon", "start"]).passes();
    let cli_version = gw.cg().args(&["--version"]).passes().stdout();
    let daemon_version = gw.cg().args(&["daemon", "--version"]).passes().stdout();

    let cli_version = cli_version.trim().trim_start_matches("cg ");
    assert_eq!(daemon_version.trim(), format!("cgd {}", cli_version));
}

#[test]
fn invalid_config_surfaces_the_startup_error() {
    let gw = Gateway::new();
    gw.config("ceiling_secs = 0\n");
    gw.cg()
        .args(&["daemon", "start"])
        .fails()
        .stderr_has("ceiling_secs must be positive");
    assert!(!gw.state_path().join("daemon.pid").exists());
}

#[test]
fn crashed_daemon_is_replaced_on_next_exec() {
    let gw = Gateway::new();
    gw.config("shell = \"sh\"\n");
    gw.cg().args(&["daemon", "start"]).passes();
    let pid = gw.daemon_pid().unwrap();

    std::process::Command::new("kill")
        .args(["-9", &pid.to_string()])
        .status()
        .unwrap();
    assert!(wait_for(SPEC_WAIT_MAX_MS, || {
        !std::process::Command::new("kill")
            .args(["-0", &pid.to_string()])
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }));

    gw.cg()
        .args(&["exec", "--", "echo", "recovered"])
        .passes()
        .stdout_eq("recovered\n");
    assert_ne!(gw.daemon_pid(), Some(pid));
}
