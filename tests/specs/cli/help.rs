//! Help and usage specs

use crate::prelude::*;

#[test]
fn top_level_help_lists_commands() {
    let gw = Gateway::new();
    gw.cg()
        .args(&["--help"])
        .passes()
        .stdout_has("exec")
        .stdout_has("cancel")
        .stdout_has("probe")
        .stdout_has("session")
        .stdout_has("process")
        .stdout_has("daemon");
}

#[test]
fn no_subcommand_prints_help() {
    let gw = Gateway::new();
    gw.cg().passes().stdout_has("Usage: cg");
}

#[test]
fn daemon_without_subcommand_prints_its_help() {
    let gw = Gateway::new();
    gw.cg()
        .args(&["daemon"])
        .passes()
        .stdout_has("start")
        .stdout_has("stop")
        .stdout_has("logs");
}

#[test]
fn exec_help_documents_cancellation_id() {
    let gw = Gateway::new();
    gw.cg()
        .args(&["exec", "--help"])
        .passes()
        .stdout_has("--id")
        .stdout_has("--cluster")
        .stdout_has("--credentials-file");
}
