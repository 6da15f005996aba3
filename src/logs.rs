//! Live log storage.
//!
//! Holds the current content of each daily or activity log. The evidence core
//! only writes here after a revision has been recorded; draft saves go straight
//! through.
use crate::paths::StorePaths;
use crate::store::write_atomic;
use crate::types::LogType;
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::sync::{Mutex, OnceLock};

/// Current-content storage for logs.
pub trait LogStore: Send + Sync {
    fn get_log(&self, log_type: LogType, log_id: &str) -> Result<Option<Value>>;

    /// Replace the stored content of a log.
    fn update_log(&self, log_type: LogType, log_id: &str, content: &Value) -> Result<()>;
}

fn log_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,127}$").expect("compile log id pattern")
    })
}

/// Reject ids that cannot be used as a single file name.
pub fn validate_log_id(log_id: &str) -> Result<()> {
    if !log_id_pattern().is_match(log_id) {
        return Err(anyhow!(
            "log id must be 1-128 characters of [A-Za-z0-9._-] starting alphanumeric (got {log_id:?})"
        ));
    }
    Ok(())
}

/// Directory-backed log storage under `logs/<type>/<id>.json`.
#[derive(Debug, Clone)]
pub struct FileLogStore {
    paths: StorePaths,
}

impl FileLogStore {
    pub fn new(paths: StorePaths) -> Self {
        Self { paths }
    }
}

impl LogStore for FileLogStore {
    fn get_log(&self, log_type: LogType, log_id: &str) -> Result<Option<Value>> {
        validate_log_id(log_id)?;
        let path = self.paths.log_path(log_type, log_id);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).with_context(|| format!("read {}", path.display()))?;
        let value = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse {}", path.display()))?;
        Ok(Some(value))
    }

    fn update_log(&self, log_type: LogType, log_id: &str, content: &Value) -> Result<()> {
        validate_log_id(log_id)?;
        let path = self.paths.log_path(log_type, log_id);
        let text = serde_json::to_string_pretty(content).context("serialize log content")?;
        write_atomic(&path, text.as_bytes())
    }
}

/// In-memory log storage for tests.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    logs: Mutex<HashMap<(LogType, String), Value>>,
    fail_updates: Mutex<bool>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle whether `update_log` fails.
    pub fn set_fail_updates(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_updates.lock() {
            *flag = fail;
        }
    }
}

impl LogStore for MemoryLogStore {
    fn get_log(&self, log_type: LogType, log_id: &str) -> Result<Option<Value>> {
        let logs = self
            .logs
            .lock()
            .map_err(|_| anyhow!("log store lock poisoned"))?;
        Ok(logs.get(&(log_type, log_id.to_string())).cloned())
    }

    fn update_log(&self, log_type: LogType, log_id: &str, content: &Value) -> Result<()> {
        let fail = *self
            .fail_updates
            .lock()
            .map_err(|_| anyhow!("log store lock poisoned"))?;
        if fail {
            return Err(anyhow!("simulated log update failure for {log_id}"));
        }
        let mut logs = self
            .logs
            .lock()
            .map_err(|_| anyhow!("log store lock poisoned"))?;
        logs.insert((log_type, log_id.to_string()), content.clone());
        Ok(())
    }
}
