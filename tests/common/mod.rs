//! Shared test infrastructure for integration tests.

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A throwaway evidence store directory plus helpers for driving `evlog`.
pub struct StoreFixture {
    pub dir: TempDir,
}

/// Captured result of one `evlog` invocation.
#[allow(dead_code)]
#[derive(Debug)]
pub struct CliRun {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

#[allow(dead_code)]
impl CliRun {
    fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// Parse stdout as JSON, panicking with stderr on failure.
    pub fn json(&self) -> Value {
        assert!(self.success, "evlog failed: {}", self.stderr);
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|err| panic!("stdout is not JSON ({err}): {}", self.stdout))
    }
}

#[allow(dead_code)]
impl StoreFixture {
    pub fn create() -> Self {
        Self {
            dir: TempDir::new().expect("create temp store dir"),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("store")
    }

    /// Write a JSON document next to the store and return its path.
    pub fn write_json(&self, name: &str, value: &Value) -> PathBuf {
        let path = self.dir.path().join(name);
        let text = serde_json::to_string_pretty(value).expect("serialize fixture JSON");
        std::fs::write(&path, text).expect("write fixture JSON");
        path
    }

    /// Run `evlog --store <root> <args...>`.
    pub fn evlog<I, S>(&self, args: I) -> CliRun
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let output = Command::new(env!("CARGO_BIN_EXE_evlog"))
            .arg("--store")
            .arg(self.root())
            .args(args)
            .env_remove("RUST_LOG")
            .output()
            .expect("spawn evlog");
        CliRun::from_output(output)
    }
}

/// Read a persisted collection straight from disk.
#[allow(dead_code)]
pub fn read_collection(root: &Path, key: &str) -> Value {
    let path = root.join("evidence").join(format!("{key}.json"));
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("read {}: {err}", path.display()));
    serde_json::from_str(&text).expect("parse collection JSON")
}
