//! End-to-end tests for the `evlog` binary.
//!
//! These drive the CLI against a temp store the way a user would: save a
//! draft, finalize it, attempt edits, and build a pack.

mod common;

use common::StoreFixture;
use serde_json::json;

const NOTE_45: &str = "Slider was set one step lower than I intended";

fn finalized_fixture() -> StoreFixture {
    let fixture = StoreFixture::create();
    let draft = fixture.write_json("draft.json", &json!({"pain_level": 6, "notes": "stiff"}));
    let run = fixture.evlog([
        "log",
        "save",
        "--id",
        "log-1",
        "--type",
        "daily",
        "--file",
        draft.to_str().expect("utf-8 path"),
    ]);
    assert_eq!(run.json()["outcome"], json!("saved"));

    let run = fixture.evlog([
        "log",
        "finalize",
        "--id",
        "log-1",
        "--type",
        "daily",
        "--profile",
        "profile-1",
    ]);
    assert_eq!(run.json()["finalized_by"], json!("profile-1"));
    fixture
}

fn revise(fixture: &StoreFixture, note: &str) -> common::CliRun {
    let fixed = fixture.write_json("fixed.json", &json!({"pain_level": 7, "notes": "stiff"}));
    fixture.evlog([
        "log",
        "revise",
        "--id",
        "log-1",
        "--type",
        "daily",
        "--profile",
        "profile-1",
        "--file",
        fixed.to_str().expect("utf-8 path"),
        "--category",
        "incorrect_value",
        "--note",
        note,
    ])
}

#[test]
fn finalized_log_reports_cannot_modify() {
    let fixture = finalized_fixture();
    let status = fixture.evlog(["log", "status", "--id", "log-1"]).json();
    assert_eq!(status["finalized"], json!(true));
    assert_eq!(status["can_modify"], json!(false));
    assert_eq!(status["revision_count"], json!(0));
}

#[test]
fn short_note_prints_validation_message_and_records_nothing() {
    let fixture = finalized_fixture();
    let run = revise(&fixture, "typo.");
    assert!(!run.success);
    assert!(
        run.stderr
            .contains("Provide a neutral reason of at least 20 characters for this revision."),
        "stderr was: {}",
        run.stderr
    );
    let status = fixture.evlog(["log", "status", "--id", "log-1"]).json();
    assert_eq!(status["revision_count"], json!(0));
}

#[test]
fn revision_is_listed_and_save_is_refused_after_finalize() {
    let fixture = finalized_fixture();
    let outcome = revise(&fixture, NOTE_45).json();
    assert_eq!(outcome["success"], json!(true));
    assert_eq!(outcome["needs_revision"], json!(true));
    assert_eq!(
        outcome["revision"]["original_snapshot"]["pain_level"],
        json!(6)
    );

    let revisions = fixture.evlog(["log", "revisions", "--id", "log-1"]).json();
    assert_eq!(revisions.as_array().map(Vec::len), Some(1));
    assert_eq!(revisions[0]["reason_category"], json!("incorrect_value"));
    assert_eq!(
        revisions[0]["reason_label"],
        json!("Corrected incorrect value")
    );

    let overwrite = fixture.write_json("overwrite.json", &json!({"pain_level": 1}));
    let run = fixture.evlog([
        "log",
        "save",
        "--id",
        "log-1",
        "--type",
        "daily",
        "--file",
        overwrite.to_str().expect("utf-8 path"),
    ]);
    assert_eq!(run.json()["outcome"], json!("needs_revision"));
}

#[test]
fn duplicate_finalize_fails() {
    let fixture = finalized_fixture();
    let run = fixture.evlog([
        "log",
        "finalize",
        "--id",
        "log-1",
        "--type",
        "daily",
        "--profile",
        "profile-2",
    ]);
    assert!(!run.success);
    assert!(run.stderr.contains("already finalized"), "{}", run.stderr);
}

#[test]
fn pack_create_and_show_round_trip() {
    let fixture = finalized_fixture();
    revise(&fixture, NOTE_45).json();
    fixture
        .evlog(["mode", "enable", "--profile", "profile-1"])
        .json();

    let pack = fixture
        .evlog([
            "pack",
            "create",
            "--profile",
            "profile-1",
            "--title",
            "June review",
            "--start",
            "2024-06-01",
            "--end",
            "2024-06-30",
            "--daily",
            "log-1",
        ])
        .json();
    assert_eq!(pack["generation_metadata"]["total_revisions"], json!(1));
    assert_eq!(pack["generation_metadata"]["evidence_mode_enabled"], json!(true));
    assert_eq!(pack["app_version"], json!(env!("CARGO_PKG_VERSION")));

    revise(&fixture, NOTE_45).json();
    let id = pack["id"].as_str().expect("pack id");
    let shown = fixture.evlog(["pack", "show", "--id", id]).json();
    assert_eq!(shown["generation_metadata"]["total_revisions"], json!(1));

    let listed = fixture
        .evlog(["pack", "list", "--profile", "profile-1"])
        .json();
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    let missing = fixture.evlog(["pack", "show", "--id", "pack-nope"]);
    assert!(!missing.success);
}
