//! Evidence orchestration.
//!
//! `EvidenceService` is the single decision point for edits: draft logs are
//! written straight through, finalized logs change only by way of a recorded
//! revision. It also exposes every query and command the UI layer uses.
use crate::config::EvidenceModeManager;
use crate::error::{EvidenceError, Result};
use crate::finalization::FinalizationRegistry;
use crate::logs::{validate_log_id, FileLogStore, LogStore};
use crate::packs::{PackAssembler, PackRequest};
use crate::policy::validate_reason_note;
use crate::revisions::{NewRevision, RevisionLedger};
use crate::store::{lock_collection, FileStore, KeyValueStore};
use crate::types::{
    EvidenceModeConfig, LogFinalization, LogType, ReasonCategory, RevisionRecord, SubmissionPack,
};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Persistence key reported for live log storage failures.
const LOGS_KEY: &str = "logs";

/// Field label used when no top-level difference can be named.
const WHOLE_LOG_FIELD: &str = "log";

/// Whether a log may be edited directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModifyCheck {
    pub can_modify: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Result of routing a save through the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    /// Draft log written to storage.
    Saved,
    /// Log is finalized; nothing was written. Use a revision instead.
    NeedsRevision,
}

/// A correction to a finalized log.
#[derive(Debug, Clone)]
pub struct RevisionRequest {
    pub log_id: String,
    pub log_type: LogType,
    pub profile_id: String,
    pub original_log: Value,
    pub updated_log: Value,
    pub reason_category: ReasonCategory,
    pub reason_note: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevisionOutcome {
    pub success: bool,
    pub needs_revision: bool,
    pub revision: RevisionRecord,
}

pub struct EvidenceService {
    mode: Arc<EvidenceModeManager>,
    finalizations: Arc<FinalizationRegistry>,
    revisions: Arc<RevisionLedger>,
    packs: PackAssembler,
    logs: Arc<dyn LogStore>,
    /// Held across every finalization check and the log write it guards.
    edits: Mutex<()>,
}

impl EvidenceService {
    /// Load every collection from `store` and wire the components together.
    pub fn open(store: Arc<dyn KeyValueStore>, logs: Arc<dyn LogStore>) -> Result<Self> {
        let mode = Arc::new(EvidenceModeManager::load(store.clone())?);
        let finalizations = Arc::new(FinalizationRegistry::load(store.clone())?);
        let revisions = Arc::new(RevisionLedger::load(store.clone())?);
        let packs = PackAssembler::load(
            store,
            mode.clone(),
            finalizations.clone(),
            revisions.clone(),
        )?;
        tracing::debug!(
            evidence_mode = mode.is_enabled(),
            finalized = finalizations.list(None).len(),
            "evidence service opened"
        );
        Ok(Self {
            mode,
            finalizations,
            revisions,
            packs,
            logs,
            edits: Mutex::new(()),
        })
    }

    /// Open a service backed by a store directory on disk.
    pub fn open_dir(root: PathBuf) -> Result<Self> {
        let store = FileStore::open(root)
            .map_err(|err| EvidenceError::persistence("schema", err))?;
        let logs = FileLogStore::new(store.paths().clone());
        Self::open(Arc::new(store), Arc::new(logs))
    }

    pub fn enable_evidence_mode(&self, profile_id: &str) -> Result<()> {
        self.mode.enable(profile_id)
    }

    pub fn disable_evidence_mode(&self) -> Result<()> {
        self.mode.disable()
    }

    pub fn is_evidence_mode_enabled(&self) -> bool {
        self.mode.is_enabled()
    }

    pub fn evidence_mode_config(&self) -> EvidenceModeConfig {
        self.mode.config()
    }

    pub fn is_log_finalized(&self, log_id: &str) -> bool {
        self.finalizations.is_finalized(log_id)
    }

    pub fn can_modify_log(&self, log_id: &str) -> ModifyCheck {
        if self.finalizations.is_finalized(log_id) {
            ModifyCheck {
                can_modify: false,
                reason: Some(
                    "This log is finalized. Changes must be recorded as a revision.".to_string(),
                ),
            }
        } else {
            ModifyCheck {
                can_modify: true,
                reason: None,
            }
        }
    }

    pub fn get_finalization(&self, log_id: &str) -> Option<LogFinalization> {
        self.finalizations.get(log_id)
    }

    pub fn list_finalized(&self, log_type: Option<LogType>) -> Vec<LogFinalization> {
        self.finalizations.list(log_type)
    }

    /// Finalize a log. A repeat attempt fails with `AlreadyFinalized`.
    pub fn finalize_log(
        &self,
        log_id: &str,
        log_type: LogType,
        profile_id: &str,
    ) -> Result<LogFinalization> {
        check_log_id(log_id)?;
        let _edit = lock_collection(&self.edits);
        self.finalizations.finalize(log_id, log_type, profile_id)
    }

    /// Current stored content of a log.
    pub fn get_log(&self, log_type: LogType, log_id: &str) -> Result<Option<Value>> {
        self.logs
            .get_log(log_type, log_id)
            .map_err(|err| EvidenceError::persistence(LOGS_KEY, err))
    }

    /// Route an ordinary save: drafts are written, finalized logs are refused.
    pub fn save_log(&self, log_id: &str, log_type: LogType, content: &Value) -> Result<SaveOutcome> {
        check_log_id(log_id)?;
        let _edit = lock_collection(&self.edits);
        if self.finalizations.is_finalized(log_id) {
            tracing::debug!(log_id, "save refused for finalized log");
            return Ok(SaveOutcome::NeedsRevision);
        }
        self.logs
            .update_log(log_type, log_id, content)
            .map_err(|err| EvidenceError::persistence(LOGS_KEY, err))?;
        tracing::debug!(log_id, log_type = %log_type, "draft log saved");
        Ok(SaveOutcome::Saved)
    }

    /// Record a revision for a finalized log, then apply the update.
    ///
    /// Nothing is written when validation fails, the log is not finalized, or
    /// the request names a different log type than the finalization. If the
    /// ledger append succeeds but the log update fails, the revision stays and
    /// `ReconciliationRequired` is returned.
    pub fn update_log_with_revision(&self, request: RevisionRequest) -> Result<RevisionOutcome> {
        check_log_id(&request.log_id)?;
        let _edit = lock_collection(&self.edits);
        let finalization = self
            .finalizations
            .get(&request.log_id)
            .ok_or_else(|| EvidenceError::not_found("finalization", &request.log_id))?;
        if finalization.log_type != request.log_type {
            return Err(EvidenceError::Validation(format!(
                "log {} was finalized as a {} log, not {}",
                request.log_id, finalization.log_type, request.log_type
            )));
        }
        validate_reason_note(request.reason_note.as_deref())?;

        let field_path = changed_field_label(&request.original_log, &request.updated_log);
        let revision = self.revisions.create_revision(NewRevision {
            log_id: request.log_id.clone(),
            log_type: request.log_type,
            profile_id: request.profile_id,
            field_path,
            original_value: request.original_log.clone(),
            updated_value: request.updated_log.clone(),
            reason_category: request.reason_category,
            reason_note: request.reason_note,
            original_snapshot: Some(request.original_log),
            summary: request.summary,
        })?;

        if let Err(err) = self
            .logs
            .update_log(request.log_type, &request.log_id, &request.updated_log)
        {
            tracing::warn!(
                log_id = %request.log_id,
                revision_id = %revision.id,
                error = %err,
                "revision recorded but log update failed"
            );
            return Err(EvidenceError::ReconciliationRequired {
                log_id: request.log_id,
                revision_id: revision.id,
                source: err,
            });
        }

        Ok(RevisionOutcome {
            success: true,
            needs_revision: true,
            revision,
        })
    }

    pub fn get_revision_count(&self, log_id: &str) -> usize {
        self.revisions.get_revision_count(log_id)
    }

    /// Revisions in the order they were recorded.
    pub fn get_log_revisions(&self, log_id: &str) -> Vec<RevisionRecord> {
        self.revisions.get_revisions(log_id)
    }

    pub fn get_log_revisions_newest_first(&self, log_id: &str) -> Vec<RevisionRecord> {
        self.revisions.revisions_newest_first(log_id)
    }

    pub fn create_pack(&self, request: PackRequest) -> Result<SubmissionPack> {
        self.packs.create_pack(request)
    }

    pub fn get_submission_packs(&self, profile_id: Option<&str>) -> Vec<SubmissionPack> {
        self.packs.get_packs(profile_id)
    }

    pub fn get_submission_pack(&self, pack_id: &str) -> Option<SubmissionPack> {
        self.packs.get_pack(pack_id)
    }
}

/// Reject ids the log store could never write, before anything is recorded.
fn check_log_id(log_id: &str) -> Result<()> {
    validate_log_id(log_id).map_err(|err| EvidenceError::Validation(err.to_string()))
}

/// Describe which top-level fields differ between two versions of a log.
///
/// The label is informational; the update always replaces the whole log.
pub fn changed_field_label(original: &Value, updated: &Value) -> String {
    let (Some(before), Some(after)) = (original.as_object(), updated.as_object()) else {
        return WHOLE_LOG_FIELD.to_string();
    };
    let mut changed: Vec<&str> = before
        .keys()
        .chain(after.keys())
        .map(String::as_str)
        .filter(|key| before.get(*key) != after.get(*key))
        .collect();
    changed.sort_unstable();
    changed.dedup();
    if changed.is_empty() {
        return WHOLE_LOG_FIELD.to_string();
    }
    changed.join(",")
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
