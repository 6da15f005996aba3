//! Append-only revision ledger.
//!
//! Every correction to a finalized log is recorded here with both the before and
//! after content. Entries are never edited or removed, and the ledger applies no
//! content policy of its own.
use crate::error::{EvidenceError, Result};
use crate::store::{get_or_default, lock_collection, set_json, KeyValueStore, REVISIONS_KEY};
use crate::types::{now_epoch_ms, record_id, LogType, ReasonCategory, RevisionRecord};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Caller-supplied fields for a new ledger entry.
#[derive(Debug, Clone)]
pub struct NewRevision {
    pub log_id: String,
    pub log_type: LogType,
    pub profile_id: String,
    pub field_path: String,
    pub original_value: Value,
    pub updated_value: Value,
    pub reason_category: ReasonCategory,
    pub reason_note: Option<String>,
    pub original_snapshot: Option<Value>,
    pub summary: Option<String>,
}

#[derive(Default)]
struct Ledger {
    /// All records in append order; this is the persisted layout.
    records: Vec<RevisionRecord>,
    /// log id -> positions in `records`, ascending.
    by_log: HashMap<String, Vec<usize>>,
}

impl Ledger {
    fn from_records(records: Vec<RevisionRecord>) -> Self {
        let mut by_log: HashMap<String, Vec<usize>> = HashMap::new();
        for (pos, record) in records.iter().enumerate() {
            by_log.entry(record.log_id.clone()).or_default().push(pos);
        }
        Self { records, by_log }
    }

    fn count(&self, log_id: &str) -> usize {
        self.by_log.get(log_id).map_or(0, Vec::len)
    }
}

pub struct RevisionLedger {
    store: Arc<dyn KeyValueStore>,
    ledger: Mutex<Ledger>,
}

impl RevisionLedger {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let records: Vec<RevisionRecord> = get_or_default(store.as_ref(), REVISIONS_KEY)
            .map_err(|err| EvidenceError::persistence(REVISIONS_KEY, err))?;
        Ok(Self {
            store,
            ledger: Mutex::new(Ledger::from_records(records)),
        })
    }

    /// Append a revision and persist the whole ledger.
    ///
    /// On a failed write the in-memory ledger is left exactly as it was.
    pub fn create_revision(&self, revision: NewRevision) -> Result<RevisionRecord> {
        let mut ledger = lock_collection(&self.ledger);
        let revision_timestamp =
            now_epoch_ms().map_err(|err| EvidenceError::persistence(REVISIONS_KEY, err))?;
        let record = RevisionRecord {
            id: record_id("rev", ledger.records.len() + 1, revision_timestamp),
            log_id: revision.log_id,
            log_type: revision.log_type,
            profile_id: revision.profile_id,
            field_path: revision.field_path,
            original_value: revision.original_value,
            updated_value: revision.updated_value,
            original_snapshot: revision.original_snapshot,
            reason_category: revision.reason_category,
            reason_note: revision.reason_note,
            summary: revision.summary,
            revision_timestamp,
        };

        let mut next = ledger.records.clone();
        next.push(record.clone());
        set_json(self.store.as_ref(), REVISIONS_KEY, &next).map_err(|err| {
            tracing::error!(log_id = %record.log_id, error = %err, "failed to persist revision");
            EvidenceError::persistence(REVISIONS_KEY, err)
        })?;

        let pos = next.len() - 1;
        ledger.records = next;
        ledger
            .by_log
            .entry(record.log_id.clone())
            .or_default()
            .push(pos);
        tracing::info!(
            log_id = %record.log_id,
            revision_id = %record.id,
            revisions = ledger.count(&record.log_id),
            "revision appended"
        );
        Ok(record)
    }

    /// Revisions for a log in the order they were appended.
    pub fn get_revisions(&self, log_id: &str) -> Vec<RevisionRecord> {
        let ledger = lock_collection(&self.ledger);
        ledger
            .by_log
            .get(log_id)
            .map(|positions| {
                positions
                    .iter()
                    .filter_map(|pos| ledger.records.get(*pos))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Revisions for a log, most recent first. Display helper only.
    pub fn revisions_newest_first(&self, log_id: &str) -> Vec<RevisionRecord> {
        let mut revisions = self.get_revisions(log_id);
        // Reversing first keeps later appends ahead of earlier ones on equal timestamps.
        revisions.reverse();
        revisions.sort_by(|a, b| b.revision_timestamp.cmp(&a.revision_timestamp));
        revisions
    }

    pub fn get_revision_count(&self, log_id: &str) -> usize {
        lock_collection(&self.ledger).count(log_id)
    }

    /// Total revisions across a set of logs, read in one critical section.
    ///
    /// Each distinct log id is counted once even when it appears repeatedly.
    pub fn count_for_logs<'a, I>(&self, log_ids: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let ledger = lock_collection(&self.ledger);
        let unique: HashSet<&str> = log_ids.into_iter().collect();
        unique.into_iter().map(|log_id| ledger.count(log_id)).sum()
    }
}

#[cfg(test)]
#[path = "revisions_tests.rs"]
mod tests;
