use super::*;
use crate::store::MemoryStore;
use serde_json::json;

fn new_revision(log_id: &str, pain: u32) -> NewRevision {
    NewRevision {
        log_id: log_id.to_string(),
        log_type: LogType::Daily,
        profile_id: "profile-1".to_string(),
        field_path: "pain_level".to_string(),
        original_value: json!({"pain_level": pain}),
        updated_value: json!({"pain_level": pain + 1}),
        reason_category: ReasonCategory::IncorrectValue,
        reason_note: Some("entered the wrong value on the slider".to_string()),
        original_snapshot: Some(json!({"pain_level": pain})),
        summary: None,
    }
}

#[test]
fn count_grows_by_one_per_append_and_is_per_log() {
    let ledger = RevisionLedger::load(Arc::new(MemoryStore::new())).expect("load ledger");
    assert_eq!(ledger.get_revision_count("log-1"), 0);
    for expected in 1..=3 {
        ledger
            .create_revision(new_revision("log-1", expected))
            .expect("append");
        assert_eq!(ledger.get_revision_count("log-1"), expected as usize);
    }
    ledger
        .create_revision(new_revision("log-2", 1))
        .expect("append other log");
    assert_eq!(ledger.get_revision_count("log-1"), 3);
    assert_eq!(ledger.get_revision_count("log-2"), 1);
}

#[test]
fn ledger_accepts_short_notes_without_policy() {
    let ledger = RevisionLedger::load(Arc::new(MemoryStore::new())).expect("load ledger");
    let mut revision = new_revision("log-1", 2);
    revision.reason_note = Some("typo".to_string());
    let record = ledger.create_revision(revision).expect("append");
    assert_eq!(record.reason_note.as_deref(), Some("typo"));
}

#[test]
fn records_keep_insertion_order_and_unique_ids() {
    let ledger = RevisionLedger::load(Arc::new(MemoryStore::new())).expect("load ledger");
    let first = ledger.create_revision(new_revision("log-1", 1)).expect("first");
    let second = ledger.create_revision(new_revision("log-1", 2)).expect("second");
    assert_ne!(first.id, second.id);

    let revisions = ledger.get_revisions("log-1");
    assert_eq!(revisions, vec![first.clone(), second.clone()]);

    let newest = ledger.revisions_newest_first("log-1");
    assert_eq!(newest, vec![second, first]);
}

#[test]
fn failed_write_leaves_ledger_unchanged() {
    let store = Arc::new(MemoryStore::new());
    let ledger = RevisionLedger::load(store.clone()).expect("load ledger");
    ledger.create_revision(new_revision("log-1", 1)).expect("first");

    store.fail_writes_to(REVISIONS_KEY);
    let err = ledger
        .create_revision(new_revision("log-1", 2))
        .expect_err("write fails");
    assert!(matches!(err, EvidenceError::Persistence { .. }));
    assert_eq!(ledger.get_revision_count("log-1"), 1);

    let reloaded = RevisionLedger::load(store).expect("reload");
    assert_eq!(reloaded.get_revision_count("log-1"), 1);
}

#[test]
fn reload_yields_identical_ordered_records() {
    let store = Arc::new(MemoryStore::new());
    let ledger = RevisionLedger::load(store.clone()).expect("load ledger");
    for (log_id, pain) in [("log-1", 1), ("log-2", 5), ("log-1", 2), ("log-3", 7)] {
        ledger
            .create_revision(new_revision(log_id, pain))
            .expect("append");
    }

    let reloaded = RevisionLedger::load(store).expect("reload");
    for log_id in ["log-1", "log-2", "log-3"] {
        assert_eq!(reloaded.get_revisions(log_id), ledger.get_revisions(log_id));
    }
}

#[test]
fn count_for_logs_sums_distinct_ids() {
    let ledger = RevisionLedger::load(Arc::new(MemoryStore::new())).expect("load ledger");
    ledger.create_revision(new_revision("a", 1)).expect("a1");
    ledger.create_revision(new_revision("a", 2)).expect("a2");
    ledger.create_revision(new_revision("b", 1)).expect("b1");
    assert_eq!(ledger.count_for_logs(["a", "b", "a", "missing"]), 3);
    assert_eq!(ledger.count_for_logs(Vec::<&str>::new()), 0);
}
