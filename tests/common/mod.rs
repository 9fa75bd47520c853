//! Common test utilities and helpers
//!
//! Reusable builders for driving the `tracking-notify` binary in a sandboxed
//! home and project directory.

#![allow(dead_code)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// Test command builder for the tracking-notify CLI
pub struct TestCommand {
    cmd: Command,
}

impl TestCommand {
    pub fn new() -> Self {
        let cmd = Command::cargo_bin("tracking-notify")
            .expect("Failed to find tracking-notify binary");
        Self { cmd }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self.cmd.arg(arg.as_ref());
        }
        self
    }

    pub fn arg<S: AsRef<str>>(mut self, arg: S) -> Self {
        self.cmd.arg(arg.as_ref());
        self
    }

    pub fn env<K, V>(mut self, key: K, val: V) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.cmd.env(key.as_ref(), val.as_ref());
        self
    }

    pub fn stdin<S: AsRef<str>>(mut self, input: S) -> Self {
        self.cmd.write_stdin(input.as_ref());
        self
    }

    pub fn expect_success(mut self) -> TestAssertion {
        let assert = self.cmd.assert().success();
        TestAssertion { assert }
    }

    pub fn expect_failure(mut self) -> TestAssertion {
        let assert = self.cmd.assert().failure();
        TestAssertion { assert }
    }
}

impl Default for TestCommand {
    fn default() -> Self {
        Self::new()
    }
}

/// Test assertion wrapper with convenient methods
pub struct TestAssertion {
    assert: assert_cmd::assert::Assert,
}

impl TestAssertion {
    pub fn stdout_contains<S: AsRef<str>>(self, text: S) -> Self {
        let assert = self.assert.stdout(predicate::str::contains(text.as_ref()));
        Self { assert }
    }

    pub fn stdout_contains_all<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.assert = self
                .assert
                .stdout(predicate::str::contains(pattern.as_ref()));
        }
        Self {
            assert: self.assert,
        }
    }

    pub fn stderr_contains<S: AsRef<str>>(self, text: S) -> Self {
        let assert = self.assert.stderr(predicate::str::contains(text.as_ref()));
        Self { assert }
    }

    /// Stdout lines that parse as JSON
    pub fn json_lines(&self) -> Vec<serde_json::Value> {
        String::from_utf8_lossy(&self.assert.get_output().stdout)
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    pub fn done(self) -> assert_cmd::assert::Assert {
        self.assert
    }
}

/// Temporary project directory plus an isolated home so the user's global
/// configuration is never read or written
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub home_dir: TempDir,
    pub config_path: std::path::PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let home_dir = TempDir::new().expect("Failed to create temp home");
        let config_path = temp_dir.path().join(".tracking-notify/config.toml");

        Self {
            temp_dir,
            home_dir,
            config_path,
        }
    }

    pub fn init_config(&self) -> TestAssertion {
        self.command().arg("init").expect_success()
    }

    pub fn project_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Command bound to this environment's project and home
    pub fn command(&self) -> TestCommand {
        let home = self.home_dir.path().to_string_lossy().to_string();
        TestCommand::new()
            .env("HOME", &home)
            .env("XDG_CONFIG_HOME", format!("{}/.config", home))
            .env("RUST_LOG", "warn")
            .arg("--project")
            .arg(self.project_path().to_string_lossy().as_ref())
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

/// Assertion helpers for common patterns
pub mod assertions {
    pub fn assert_path_exists<P: AsRef<std::path::Path>>(path: P) {
        assert!(
            path.as_ref().exists(),
            "Path should exist: {}",
            path.as_ref().display()
        );
    }

    /// Index of the first event with the given `type` tag
    pub fn position_of(events: &[serde_json::Value], event_type: &str) -> Option<usize> {
        events.iter().position(|e| e["type"] == event_type)
    }
}
