// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{rotate_log_if_needed, write_startup_marker, MAX_LOG_SIZE, STARTUP_MARKER_PREFIX};
use crate::lifecycle::Config;
use serial_test::serial;
use std::io::Write;
use std::time::Duration;

fn write_bytes(path: &std::path::Path, size: u64) {
    let mut f = std::fs::File::create(path).unwrap();
    f.write_all(&vec![b'x'; size as usize]).unwrap();
}

#[test]
#[serial]
fn sweep_interval_override_from_env() {
    std::env::set_var("CG_SWEEP_MS", "250");
    assert_eq!(
        crate::env::sweep_interval_ms(),
        Some(Duration::from_millis(250))
    );
    std::env::remove_var("CG_SWEEP_MS");
}

#[test]
#[serial]
fn sweep_interval_ignores_unusable_values() {
    for value in [None, Some("soon"), Some("0")] {
        match value {
            Some(v) => std::env::set_var("CG_SWEEP_MS", v),
            None => std::env::remove_var("CG_SWEEP_MS"),
        }
        assert_eq!(crate::env::sweep_interval_ms(), None, "{value:?}");
    }
    std::env::remove_var("CG_SWEEP_MS");
}

#[test]
#[serial]
fn state_dir_prefers_explicit_override() {
    std::env::set_var("CG_STATE_DIR", "/tmp/cg-explicit");
    std::env::set_var("XDG_STATE_HOME", "/tmp/xdg");
    assert_eq!(
        crate::env::state_dir().unwrap(),
        std::path::PathBuf::from("/tmp/cg-explicit")
    );
    std::env::remove_var("CG_STATE_DIR");
    assert_eq!(
        crate::env::state_dir().unwrap(),
        std::path::PathBuf::from("/tmp/xdg/cg")
    );
    std::env::remove_var("XDG_STATE_HOME");
}

#[test]
fn startup_marker_is_appended_with_pid() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::under(dir.path().to_owned());
    std::fs::write(&config.log_path, "previous run\n").unwrap();

    write_startup_marker(&config).unwrap();

    let log = std::fs::read_to_string(&config.log_path).unwrap();
    let last = log.lines().last().unwrap();
    assert!(log.starts_with("previous run\n"));
    assert_eq!(
        last,
        format!("{STARTUP_MARKER_PREFIX}{}) ---", std::process::id())
    );
}

#[test]
fn rotate_skips_small_file() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("daemon.log");
    write_bytes(&log, 1024);

    rotate_log_if_needed(&log);

    assert!(log.exists());
    assert!(!dir.path().join("daemon.log.1").exists());
}

#[test]
fn rotate_shifts_existing_rotations() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("daemon.log");
    write_bytes(&dir.path().join("daemon.log.1"), 100);
    write_bytes(&dir.path().join("daemon.log.2"), 200);
    write_bytes(&log, MAX_LOG_SIZE + 1);

    rotate_log_if_needed(&log);

    assert!(!log.exists());
    let size = |n: u32| {
        std::fs::metadata(dir.path().join(format!("daemon.log.{n}")))
            .unwrap()
            .len()
    };
    assert_eq!(size(1), MAX_LOG_SIZE + 1);
    assert_eq!(size(2), 100);
    assert_eq!(size(3), 200);
}

#[test]
fn rotate_drops_oldest_when_full() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("daemon.log");
    write_bytes(&dir.path().join("daemon.log.1"), 100);
    write_bytes(&dir.path().join("daemon.log.2"), 200);
    write_bytes(&dir.path().join("daemon.log.3"), 300);
    write_bytes(&log, MAX_LOG_SIZE + 1);

    rotate_log_if_needed(&log);

    assert!(!dir.path().join("daemon.log.4").exists());
    assert_eq!(
        std::fs::metadata(dir.path().join("daemon.log.3"))
            .unwrap()
            .len(),
        200
    );
}

#[test]
fn rotate_noop_when_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    rotate_log_if_needed(&dir.path().join("daemon.log"));
}
