//! Durable key-value persistence for the evidence collections.
//!
//! Each logical key holds one whole collection serialized as JSON. Writers
//! replace the full document; there is no partial update.
use crate::paths::StorePaths;
use crate::types::STORE_SCHEMA_VERSION;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Logical key for the evidence mode config.
pub const CONFIG_KEY: &str = "config";
/// Logical key for the finalization list.
pub const FINALIZATIONS_KEY: &str = "finalizations";
/// Logical key for the revision ledger.
pub const REVISIONS_KEY: &str = "revisions";
/// Logical key for the submission pack list.
pub const PACKS_KEY: &str = "submission_packs";

/// Whole-document key-value persistence.
pub trait KeyValueStore: Send + Sync {
    /// Return the stored document for `key`, or `None` when it was never written.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Replace the stored document for `key`.
    fn set(&self, key: &str, value: &Value) -> Result<()>;
}

/// Decode the document under `key`, falling back to `T::default()` when absent.
pub fn get_or_default<T>(store: &dyn KeyValueStore, key: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de> + Default,
{
    match store.get(key)? {
        Some(value) => serde_json::from_value(value).with_context(|| format!("parse {key}")),
        None => Ok(T::default()),
    }
}

/// Encode `value` and write it under `key`.
pub fn set_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let value = serde_json::to_value(value).with_context(|| format!("serialize {key}"))?;
    store.set(key, &value)
}

/// Enter a collection's critical section.
///
/// In-memory collections only change after a durable write succeeds, so a
/// guard abandoned by a panicking holder still protects consistent state.
pub(crate) fn lock_collection<T>(collection: &Mutex<T>) -> MutexGuard<'_, T> {
    collection.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Serialize, Deserialize)]
struct SchemaMarker {
    schema_version: u32,
}

/// Directory-backed store: one pretty JSON file per key under `evidence/`.
#[derive(Debug, Clone)]
pub struct FileStore {
    paths: StorePaths,
}

impl FileStore {
    /// Open (or initialize) a store rooted at `root`.
    pub fn open(root: PathBuf) -> Result<Self> {
        let paths = StorePaths::new(root);
        let dir = paths.evidence_dir();
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        let schema_path = paths.schema_path();
        if schema_path.is_file() {
            let bytes = fs::read(&schema_path)
                .with_context(|| format!("read {}", schema_path.display()))?;
            let marker: SchemaMarker =
                serde_json::from_slice(&bytes).context("parse store schema JSON")?;
            if marker.schema_version != STORE_SCHEMA_VERSION {
                return Err(anyhow!(
                    "unsupported evidence store schema_version {}",
                    marker.schema_version
                ));
            }
        } else {
            let marker = SchemaMarker {
                schema_version: STORE_SCHEMA_VERSION,
            };
            let text = serde_json::to_string_pretty(&marker).context("serialize store schema")?;
            write_atomic(&schema_path, text.as_bytes())?;
        }
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.paths.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).with_context(|| format!("read {}", path.display()))?;
        let value = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse {}", path.display()))?;
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        let path = self.paths.key_path(key);
        let text = serde_json::to_string_pretty(value).with_context(|| format!("serialize {key}"))?;
        write_atomic(&path, text.as_bytes())
    }
}

/// Write `bytes` to `path` through a temp file in the same directory.
///
/// Readers see either the previous document or the new one, never a torn write.
pub fn write_atomic(path: &std::path::Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("{} has no parent directory", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in {}", parent.display()))?;
    tmp.write_all(bytes)
        .with_context(|| format!("write {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("sync {}", path.display()))?;
    tmp.persist(path)
        .map_err(|err| anyhow!("publish {}: {}", path.display(), err.error))?;
    Ok(())
}

/// In-memory store for tests and ephemeral sessions.
///
/// Keys listed via [`MemoryStore::fail_writes_to`] reject every `set`, which lets
/// callers exercise persistence-failure paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<String, Value>>,
    failing: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write to `key` fail.
    pub fn fail_writes_to(&self, key: &str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(key.to_string());
        }
    }

    /// Let writes to `key` succeed again.
    pub fn restore_writes_to(&self, key: &str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.remove(key);
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let docs = self
            .docs
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(docs.get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        let failing = self
            .failing
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        if failing.contains(key) {
            return Err(anyhow!("simulated write failure for {key}"));
        }
        drop(failing);
        let mut docs = self
            .docs
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        docs.insert(key.to_string(), value.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
