//! `cg cancel` specs

use crate::prelude::*;

fn gateway() -> Gateway {
    let gw = Gateway::new();
    gw.config("shell = \"sh\"\nceiling_secs = 20\nkill_grace_ms = 300\ndrain_ms = 200\n");
    gw
}

#[test]
fn cancel_stops_a_tracked_execution() {
    let gw = gateway();
    gw.cg().args(&["daemon", "start"]).passes();

    let running = gw
        .cg()
        .args(&["exec", "--id", "slow-1", "--", "sleep 30"])
        .spawn();

    let listed = wait_for(SPEC_WAIT_MAX_MS, || {
        gw.cg()
            .args(&["process", "list"])
            .command()
            .output()
            .map(|o| String::from_utf8_lossy(&o.stdout).contains("slow-1"))
            .unwrap_or(false)
    });
    assert!(listed, "process never registered\n{}", gw.daemon_log());

    gw.cg()
        .args(&["cancel", "slow-1"])
        .passes()
        .stdout_has("Process slow-1 cancelled");

    let output = running.wait_with_output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cancelled"));

    gw.cg()
        .args(&["process", "list"])
        .passes()
        .stdout_eq("No running processes\n");
}

#[test]
fn cancelling_an_unknown_id_fails() {
    let gw = gateway();
    gw.cg().args(&["daemon", "start"]).passes();
    gw.cg()
        .args(&["cancel", "ghost"])
        .fails()
        .stderr_has("No running process with id ghost");
}

#[test]
fn finished_execution_is_no_longer_cancellable() {
    let gw = gateway();
    gw.cg()
        .args(&["exec", "--id", "quick", "--", "true"])
        .passes();
    gw.cg()
        .args(&["cancel", "quick"])
        .fails()
        .stderr_has("No running process with id quick");
}
