//! `cg exec` specs in server mode

use crate::prelude::*;

fn gateway() -> Gateway {
    let gw = Gateway::new();
    gw.config("shell = \"sh\"\nceiling_secs = 5\nkill_grace_ms = 300\ndrain_ms = 200\n");
    gw
}

#[test]
fn output_goes_to_stdout_and_summary_to_stderr() {
    let gw = gateway();
    gw.cg()
        .args(&["exec", "--", "echo", "hello"])
        .passes()
        .stdout_eq("hello\n")
        .stderr_has("Command completed successfully");
}

#[test]
fn stderr_of_the_command_is_part_of_the_output() {
    let gw = gateway();
    gw.cg()
        .args(&["exec", "--", "echo out; echo err >&2"])
        .passes()
        .stdout_has("out")
        .stdout_has("err");
}

#[test]
fn failing_command_exits_one_with_a_classified_message() {
    let gw = gateway();
    let run = gw
        .cg()
        .args(&["exec", "--", "definitely-not-a-tool-xyz"])
        .fails()
        .stderr_has("Error: A required command-line tool is not installed");
    assert_eq!(run.code(), Some(1));
}

#[test]
fn json_output_is_the_report() {
    let gw = gateway();
    let run = gw
        .cg()
        .args(&["-o", "json", "exec", "--", "echo", "structured"])
        .passes();
    let report = run.json();
    assert_eq!(report["success"], true);
    assert_eq!(report["output"], "structured\n");
    assert!(report["duration_ms"].as_u64().unwrap() >= 10);
}

#[test]
fn json_failure_still_prints_the_report() {
    let gw = gateway();
    let run = gw.cg().args(&["-o", "json", "exec", "--", "exit 3"]).fails();
    assert_eq!(run.code(), Some(1));
    assert_eq!(run.json()["success"], false);
    assert!(run.stderr().is_empty(), "stderr: {}", run.stderr());
}

#[test]
fn hard_deadline_stops_runaway_commands() {
    let gw = Gateway::new();
    gw.config("shell = \"sh\"\nceiling_secs = 1\nkill_grace_ms = 200\ndrain_ms = 100\n");
    let start = std::time::Instant::now();
    gw.cg()
        .args(&["exec", "--", "sleep 30"])
        .fails()
        .stderr_has("timed out");
    assert!(start.elapsed() < std::time::Duration::from_secs(10));
}
