//! Submission pack assembly.
//!
//! A pack bundles finalized logs with audit figures read once, at creation.
//! Packs are immutable: there is no update or delete entry point.
use crate::config::EvidenceModeManager;
use crate::error::{EvidenceError, Result};
use crate::finalization::FinalizationRegistry;
use crate::policy::validate_pack_fields;
use crate::revisions::RevisionLedger;
use crate::store::{get_or_default, lock_collection, set_json, KeyValueStore, PACKS_KEY};
use crate::types::{now_epoch_ms, record_id, GenerationMetadata, LogType, SubmissionPack};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Caller-supplied fields for a new submission pack.
#[derive(Debug, Clone, Default)]
pub struct PackRequest {
    pub profile_id: String,
    pub title: String,
    pub start_date: String,
    pub end_date: String,
    pub daily_log_ids: Vec<String>,
    pub activity_log_ids: Vec<String>,
    pub report_ids: Vec<String>,
    pub app_version: String,
}

pub struct PackAssembler {
    store: Arc<dyn KeyValueStore>,
    packs: Mutex<Vec<SubmissionPack>>,
    mode: Arc<EvidenceModeManager>,
    finalizations: Arc<FinalizationRegistry>,
    revisions: Arc<RevisionLedger>,
}

impl PackAssembler {
    pub fn load(
        store: Arc<dyn KeyValueStore>,
        mode: Arc<EvidenceModeManager>,
        finalizations: Arc<FinalizationRegistry>,
        revisions: Arc<RevisionLedger>,
    ) -> Result<Self> {
        let packs: Vec<SubmissionPack> = get_or_default(store.as_ref(), PACKS_KEY)
            .map_err(|err| EvidenceError::persistence(PACKS_KEY, err))?;
        Ok(Self {
            store,
            packs: Mutex::new(packs),
            mode,
            finalizations,
            revisions,
        })
    }

    /// Build, persist, and return a new pack.
    ///
    /// `total_revisions` is read from the ledger during this call and never
    /// recomputed afterwards.
    pub fn create_pack(&self, request: PackRequest) -> Result<SubmissionPack> {
        validate_pack_fields(&request.title, &request.start_date, &request.end_date)?;
        let daily_log_ids = dedupe_ids(request.daily_log_ids);
        let activity_log_ids = dedupe_ids(request.activity_log_ids);
        let report_ids = dedupe_ids(request.report_ids);
        if daily_log_ids.is_empty() && activity_log_ids.is_empty() {
            return Err(EvidenceError::Validation(
                "a submission pack must include at least one daily or activity log".to_string(),
            ));
        }
        self.require_finalized(&daily_log_ids, LogType::Daily)?;
        self.require_finalized(&activity_log_ids, LogType::Activity)?;

        let mut packs = lock_collection(&self.packs);
        let created_at = now_epoch_ms().map_err(|err| EvidenceError::persistence(PACKS_KEY, err))?;
        let total_revisions = self.revisions.count_for_logs(
            daily_log_ids
                .iter()
                .chain(activity_log_ids.iter())
                .map(String::as_str),
        );
        let pack = SubmissionPack {
            id: record_id("pack", packs.len() + 1, created_at),
            profile_id: request.profile_id,
            title: request.title.trim().to_string(),
            start_date: request.start_date,
            end_date: request.end_date,
            included_daily_log_ids: daily_log_ids,
            included_activity_log_ids: activity_log_ids,
            included_report_ids: report_ids,
            app_version: request.app_version,
            generation_metadata: GenerationMetadata {
                evidence_mode_enabled: self.mode.is_enabled(),
                total_revisions,
            },
            created_at,
        };

        let mut next = packs.clone();
        next.push(pack.clone());
        set_json(self.store.as_ref(), PACKS_KEY, &next).map_err(|err| {
            tracing::error!(pack_id = %pack.id, error = %err, "failed to persist submission pack");
            EvidenceError::persistence(PACKS_KEY, err)
        })?;
        *packs = next;
        tracing::info!(
            pack_id = %pack.id,
            profile_id = %pack.profile_id,
            logs = pack.included_daily_log_ids.len() + pack.included_activity_log_ids.len(),
            total_revisions,
            "submission pack created"
        );
        Ok(pack)
    }

    /// Packs in creation order, optionally limited to one profile.
    pub fn get_packs(&self, profile_id: Option<&str>) -> Vec<SubmissionPack> {
        lock_collection(&self.packs)
            .iter()
            .filter(|pack| match profile_id {
                Some(wanted) => pack.profile_id == wanted,
                None => true,
            })
            .cloned()
            .collect()
    }

    pub fn get_pack(&self, pack_id: &str) -> Option<SubmissionPack> {
        lock_collection(&self.packs)
            .iter()
            .find(|pack| pack.id == pack_id)
            .cloned()
    }

    fn require_finalized(&self, log_ids: &[String], log_type: LogType) -> Result<()> {
        for log_id in log_ids {
            match self.finalizations.get(log_id) {
                Some(entry) if entry.log_type == log_type => {}
                _ => return Err(EvidenceError::not_found("finalized log", log_id)),
            }
        }
        Ok(())
    }
}

/// Drop repeated ids, keeping the first occurrence of each.
fn dedupe_ids(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

#[cfg(test)]
#[path = "packs_tests.rs"]
mod tests;
