//! Test helpers for behavioral specifications.
//!
//! Provides a small DSL for driving `cg` against an isolated daemon.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Output;

use assert_cmd::Command;

// Aggressive timeouts for fast tests.
const CG_TIMEOUT_CONNECT_MS: &str = "2000";
const CG_TIMEOUT_EXIT_MS: &str = "500";
const CG_TIMEOUT_IPC_MS: &str = "500";
const CG_TIMEOUT_EXEC_MS: &str = "15000";
const CG_CONNECT_POLL_MS: &str = "5";

// Spec polling timeouts
pub const SPEC_POLL_INTERVAL_MS: u64 = 10;
pub const SPEC_WAIT_MAX_MS: u64 = 2000;

/// Returns the path to a workspace binary.
///
/// The specs package does not own `cg`/`cgd`, so `cargo_bin` can't find
/// them; they live next to the test binary's `deps/` directory.
fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug").join(name);
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

pub fn cg_binary() -> PathBuf {
    binary_path("cg")
}

pub fn cgd_binary() -> PathBuf {
    binary_path("cgd")
}

/// High-level CLI builder for fluent test assertions
pub struct CliBuilder {
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            envs: vec![
                (
                    "CG_DAEMON_BINARY".into(),
                    cgd_binary().to_string_lossy().into(),
                ),
                ("CG_TIMEOUT_CONNECT_MS".into(), CG_TIMEOUT_CONNECT_MS.into()),
                ("CG_TIMEOUT_EXIT_MS".into(), CG_TIMEOUT_EXIT_MS.into()),
                ("CG_TIMEOUT_IPC_MS".into(), CG_TIMEOUT_IPC_MS.into()),
                ("CG_TIMEOUT_EXEC_MS".into(), CG_TIMEOUT_EXEC_MS.into()),
                ("CG_CONNECT_POLL_MS".into(), CG_CONNECT_POLL_MS.into()),
            ],
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<Path>) -> Self {
        self.envs.push((
            key.to_string(),
            value.as_ref().to_string_lossy().to_string(),
        ));
        self
    }

    /// Build the command without running it
    pub fn command(self) -> Command {
        Command::from_std(self.std_command())
    }

    /// Start the command without waiting for it, output captured
    pub fn spawn(self) -> std::process::Child {
        self.std_command()
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .expect("command should start")
    }

    fn std_command(self) -> std::process::Command {
        let mut cmd = std::process::Command::new(cg_binary());
        cmd.args(&self.args);
        // Host credentials must not leak into specs
        for var in ["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY", "AWS_SESSION_TOKEN"] {
            cmd.env_remove(var);
        }
        for (key, value) in self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    /// Run and expect success (exit code 0)
    pub fn passes(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run and expect failure (non-zero exit code)
    pub fn fails(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

/// Result of a CLI run for chaining assertions
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn code(&self) -> Option<i32> {
        self.output.status.code()
    }

    /// Assert stdout equals expected exactly (with diff on failure).
    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout(), expected);
        self
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{}'\nstdout: {}",
            expected,
            stdout
        );
        self
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            !stdout.contains(unexpected),
            "stdout should not contain '{}'\nstdout: {}",
            unexpected,
            stdout
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain '{}'\nstderr: {}",
            expected,
            stderr
        );
        self
    }

    pub fn stderr_lacks(self, unexpected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            !stderr.contains(unexpected),
            "stderr should not contain '{}'\nstderr: {}",
            unexpected,
            stderr
        );
        self
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.output.stdout).expect("stdout should be JSON")
    }
}

/// Poll a condition until it returns true or timeout is reached.
pub fn wait_for<F>(timeout_ms: u64, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);
    let poll_interval = std::time::Duration::from_millis(SPEC_POLL_INTERVAL_MS);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(poll_interval);
    }
    false
}

// =============================================================================
// Gateway
// =============================================================================

/// Isolated state directory plus a scratch directory for stand-in tools.
pub struct Gateway {
    state_dir: tempfile::TempDir,
    tools_dir: tempfile::TempDir,
}

impl Gateway {
    pub fn new() -> Self {
        Self {
            state_dir: tempfile::tempdir().unwrap(),
            tools_dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn state_path(&self) -> &Path {
        self.state_dir.path()
    }

    /// Write `config.toml` for the next daemon start
    pub fn config(&self, content: &str) {
        std::fs::write(self.state_path().join("config.toml"), content).unwrap();
    }

    /// Write an executable script into the tools directory, returning its path
    pub fn tool(&self, name: &str, script: &str) -> PathBuf {
        let path = self.tools_dir.path().join(name);
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Run cg against this gateway's daemon
    pub fn cg(&self) -> CliBuilder {
        CliBuilder::new().env("CG_STATE_DIR", self.state_path())
    }

    pub fn daemon_log(&self) -> String {
        std::fs::read_to_string(self.state_path().join("daemon.log"))
            .unwrap_or_else(|_| "(no daemon log)".to_string())
    }

    pub fn daemon_pid(&self) -> Option<u32> {
        std::fs::read_to_string(self.state_path().join("daemon.pid"))
            .ok()?
            .trim()
            .parse()
            .ok()
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        // Always try to stop daemon (no-op if not running)
        let _ = self
            .cg()
            .args(&["daemon", "stop", "--kill"])
            .command()
            .output();
    }
}
