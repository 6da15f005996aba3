//! Typed paths into an evidence store directory.
//!
//! Centralizing path construction keeps file access consistent between the
//! key-value store, the log store, and the CLI.
use crate::types::LogType;
use std::path::PathBuf;

/// Convenience wrapper for locating evidence store artifacts.
#[derive(Debug, Clone)]
pub struct StorePaths {
    root: PathBuf,
}

impl StorePaths {
    /// Create a new path helper rooted at the store root.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Default store root under the platform data directory.
    pub fn default_root() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("evidence-log"))
    }

    /// Return the `evidence/` directory path.
    pub fn evidence_dir(&self) -> PathBuf {
        self.root.join("evidence")
    }

    /// Return the `evidence/schema.json` path.
    pub fn schema_path(&self) -> PathBuf {
        self.evidence_dir().join("schema.json")
    }

    /// Return the `evidence/<key>.json` path for a logical collection key.
    pub fn key_path(&self, key: &str) -> PathBuf {
        self.evidence_dir().join(format!("{key}.json"))
    }

    /// Return the `logs/` directory path.
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Return the `logs/<type>/<id>.json` path for one live log.
    pub fn log_path(&self, log_type: LogType, log_id: &str) -> PathBuf {
        self.logs_dir()
            .join(log_type.as_str())
            .join(format!("{log_id}.json"))
    }
}
