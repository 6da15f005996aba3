//! Finalization registry.
//!
//! Records which logs have left the draft state. Entries are created once and
//! never changed or removed.
use crate::error::{EvidenceError, Result};
use crate::store::{
    get_or_default, lock_collection, set_json, KeyValueStore, FINALIZATIONS_KEY,
};
use crate::types::{now_epoch_ms, LogFinalization, LogType};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Registry {
    entries: Vec<LogFinalization>,
    /// log id -> position in `entries`.
    index: HashMap<String, usize>,
}

impl Registry {
    fn from_entries(entries: Vec<LogFinalization>) -> Self {
        let mut index = HashMap::with_capacity(entries.len());
        for (pos, entry) in entries.iter().enumerate() {
            // First entry wins if a hand-edited file carries duplicates.
            index.entry(entry.log_id.clone()).or_insert(pos);
        }
        Self { entries, index }
    }
}

pub struct FinalizationRegistry {
    store: Arc<dyn KeyValueStore>,
    registry: Mutex<Registry>,
}

impl FinalizationRegistry {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let entries: Vec<LogFinalization> = get_or_default(store.as_ref(), FINALIZATIONS_KEY)
            .map_err(|err| EvidenceError::persistence(FINALIZATIONS_KEY, err))?;
        Ok(Self {
            store,
            registry: Mutex::new(Registry::from_entries(entries)),
        })
    }

    /// Mark a log as finalized.
    ///
    /// The existence check, the append, and the durable write all happen under
    /// one lock, so two racing calls cannot both succeed.
    pub fn finalize(
        &self,
        log_id: &str,
        log_type: LogType,
        profile_id: &str,
    ) -> Result<LogFinalization> {
        let mut registry = lock_collection(&self.registry);
        if registry.index.contains_key(log_id) {
            return Err(EvidenceError::AlreadyFinalized {
                log_id: log_id.to_string(),
            });
        }

        let finalized_at =
            now_epoch_ms().map_err(|err| EvidenceError::persistence(FINALIZATIONS_KEY, err))?;
        let entry = LogFinalization {
            log_id: log_id.to_string(),
            log_type,
            finalized_at,
            finalized_by: profile_id.to_string(),
        };

        let mut next = registry.entries.clone();
        next.push(entry.clone());
        set_json(self.store.as_ref(), FINALIZATIONS_KEY, &next).map_err(|err| {
            tracing::error!(log_id, error = %err, "failed to persist finalization");
            EvidenceError::persistence(FINALIZATIONS_KEY, err)
        })?;

        let pos = next.len() - 1;
        registry.entries = next;
        registry.index.insert(entry.log_id.clone(), pos);
        tracing::info!(log_id, log_type = %log_type, profile_id, "log finalized");
        Ok(entry)
    }

    pub fn is_finalized(&self, log_id: &str) -> bool {
        lock_collection(&self.registry).index.contains_key(log_id)
    }

    pub fn get(&self, log_id: &str) -> Option<LogFinalization> {
        let registry = lock_collection(&self.registry);
        registry
            .index
            .get(log_id)
            .and_then(|pos| registry.entries.get(*pos))
            .cloned()
    }

    /// Finalized logs in insertion order, optionally limited to one type.
    pub fn list(&self, log_type: Option<LogType>) -> Vec<LogFinalization> {
        lock_collection(&self.registry)
            .entries
            .iter()
            .filter(|entry| match log_type {
                Some(wanted) => entry.log_type == wanted,
                None => true,
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[path = "finalization_tests.rs"]
mod tests;
