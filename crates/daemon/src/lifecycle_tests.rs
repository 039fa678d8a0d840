// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn layout_is_fixed_under_the_state_dir() {
    let config = Config::under(PathBuf::from("/state/cg"));
    assert_eq!(config.socket_path, Path::new("/state/cg/daemon.sock"));
    assert_eq!(config.lock_path, Path::new("/state/cg/daemon.pid"));
    assert_eq!(config.version_path, Path::new("/state/cg/daemon.version"));
    assert_eq!(config.log_path, Path::new("/state/cg/daemon.log"));
    assert_eq!(config.config_path, Path::new("/state/cg/config.toml"));
    assert_eq!(config.kube_dir, Path::new("/state/cg/kube"));
}

#[tokio::test]
async fn startup_writes_files_and_shutdown_removes_them() {
    let dir = tempdir().unwrap();
    let config = Config::under(dir.path().to_owned());

    let StartupResult {
        mut daemon,
        listener,
    } = startup(&config).await.unwrap();

    let pid = std::fs::read_to_string(&config.lock_path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());
    assert_eq!(
        std::fs::read_to_string(&config.version_path).unwrap(),
        PROTOCOL_VERSION
    );
    assert!(config.socket_path.exists());
    assert!(config.kube_dir.is_dir());
    assert_eq!(daemon.gateway.config(), &GatewayConfig::default());

    drop(listener);
    daemon.shutdown().unwrap();
    assert!(!config.socket_path.exists());
    assert!(!config.lock_path.exists());
    assert!(!config.version_path.exists());
    assert!(!config.kube_dir.exists());
}

#[tokio::test]
async fn startup_reads_config_toml() {
    let dir = tempdir().unwrap();
    let config = Config::under(dir.path().to_owned());
    std::fs::write(&config.config_path, "ceiling_secs = 90\nshell = \"sh\"\n").unwrap();

    let result = startup(&config).await.unwrap();
    assert_eq!(result.daemon.gateway.config().ceiling_secs, 90);
}

#[tokio::test]
async fn invalid_config_fails_startup_and_cleans_up() {
    let dir = tempdir().unwrap();
    let config = Config::under(dir.path().to_owned());
    std::fs::write(&config.config_path, "ceiling_secs = \"soon\"\n").unwrap();

    match startup(&config).await {
        Err(LifecycleError::Config(_)) => {}
        Err(e) => panic!("expected Config error, got: {e}"),
        Ok(_) => panic!("expected Config error, but startup succeeded"),
    }
    assert!(!config.version_path.exists());
    assert!(!config.lock_path.exists());
    assert!(!config.socket_path.exists());
}

#[tokio::test]
async fn startup_lock_failed_does_not_remove_existing_files() {
    let dir = tempdir().unwrap();
    let config = Config::under(dir.path().to_owned());

    // Files a running daemon would have
    std::fs::write(&config.socket_path, b"").unwrap();
    std::fs::write(&config.version_path, b"0.1.0").unwrap();
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)
        .unwrap();
    lock_file.lock_exclusive().unwrap();
    std::fs::write(&config.lock_path, b"12345").unwrap();

    match startup(&config).await {
        Err(LifecycleError::LockFailed(_)) => {}
        Err(e) => panic!("expected LockFailed, got: {e}"),
        Ok(_) => panic!("expected LockFailed, but startup succeeded"),
    }

    assert!(config.socket_path.exists());
    assert!(config.version_path.exists());
    assert_eq!(
        std::fs::read_to_string(&config.lock_path).unwrap(),
        "12345"
    );
}

#[test]
fn cleanup_on_failure_removes_created_files() {
    let dir = tempdir().unwrap();
    let config = Config::under(dir.path().to_owned());
    for path in [&config.socket_path, &config.version_path, &config.lock_path] {
        std::fs::write(path, b"x").unwrap();
    }

    cleanup_on_failure(&config);

    assert!(!config.socket_path.exists());
    assert!(!config.version_path.exists());
    assert!(!config.lock_path.exists());
}
