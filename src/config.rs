//! Evidence mode configuration.
//!
//! A single flag per installation, toggled on and off. The in-memory copy only
//! changes once the new value has been written.
use crate::error::{EvidenceError, Result};
use crate::store::{get_or_default, lock_collection, set_json, KeyValueStore, CONFIG_KEY};
use crate::types::{now_epoch_ms, EvidenceModeConfig};
use std::sync::{Arc, Mutex};

pub struct EvidenceModeManager {
    store: Arc<dyn KeyValueStore>,
    state: Mutex<EvidenceModeConfig>,
}

impl EvidenceModeManager {
    /// Hydrate from the store, defaulting to disabled when nothing was saved.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let config: EvidenceModeConfig = get_or_default(store.as_ref(), CONFIG_KEY)
            .map_err(|err| EvidenceError::persistence(CONFIG_KEY, err))?;
        Ok(Self {
            store,
            state: Mutex::new(config),
        })
    }

    /// Turn evidence mode on, stamping who enabled it and when.
    pub fn enable(&self, profile_id: &str) -> Result<()> {
        let enabled_at =
            now_epoch_ms().map_err(|err| EvidenceError::persistence(CONFIG_KEY, err))?;
        self.replace(EvidenceModeConfig {
            enabled: true,
            enabled_at: Some(enabled_at),
            enabled_by: Some(profile_id.to_string()),
        })?;
        tracing::info!(profile_id, "evidence mode enabled");
        Ok(())
    }

    pub fn disable(&self) -> Result<()> {
        self.replace(EvidenceModeConfig::default())?;
        tracing::info!("evidence mode disabled");
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        lock_collection(&self.state).enabled
    }

    /// Return a copy of the current config.
    pub fn config(&self) -> EvidenceModeConfig {
        lock_collection(&self.state).clone()
    }

    fn replace(&self, next: EvidenceModeConfig) -> Result<()> {
        let mut state = lock_collection(&self.state);
        set_json(self.store.as_ref(), CONFIG_KEY, &next).map_err(|err| {
            tracing::error!(error = %err, "failed to persist evidence mode config");
            EvidenceError::persistence(CONFIG_KEY, err)
        })?;
        *state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn load_defaults_to_disabled() {
        let manager = EvidenceModeManager::load(Arc::new(MemoryStore::new())).expect("load");
        assert!(!manager.is_enabled());
        assert_eq!(manager.config(), EvidenceModeConfig::default());
    }

    #[test]
    fn enable_then_disable_round_trips_through_store() {
        let store = Arc::new(MemoryStore::new());
        let manager = EvidenceModeManager::load(store.clone()).expect("load");
        manager.enable("profile-1").expect("enable");

        let reloaded = EvidenceModeManager::load(store.clone()).expect("reload");
        let config = reloaded.config();
        assert!(config.enabled);
        assert_eq!(config.enabled_by.as_deref(), Some("profile-1"));
        assert!(config.enabled_at.is_some());

        reloaded.disable().expect("disable");
        let reloaded = EvidenceModeManager::load(store).expect("reload again");
        assert_eq!(reloaded.config(), EvidenceModeConfig::default());
    }

    #[test]
    fn failed_enable_leaves_memory_untouched() {
        let store = Arc::new(MemoryStore::new());
        let manager = EvidenceModeManager::load(store.clone()).expect("load");
        store.fail_writes_to(CONFIG_KEY);

        let err = manager.enable("profile-1").expect_err("write fails");
        assert!(err.is_retryable());
        assert!(!manager.is_enabled());
        assert_eq!(manager.config().enabled_by, None);
    }
}
