//! Shared record types for the evidence collections.
//!
//! These types mirror the persisted JSON collections so the on-disk layout and
//! the in-memory view never drift.
use crate::error::{EvidenceError, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current schema version for the store root's `evidence/schema.json`.
pub const STORE_SCHEMA_VERSION: u32 = 1;

/// Milliseconds since the Unix epoch.
pub type EpochMs = u64;

/// Kind of log a record refers to.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LogType {
    Daily,
    Activity,
}

impl LogType {
    /// Return the stable string identifier used in JSON artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Daily => "daily",
            LogType::Activity => "activity",
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogType {
    type Err = EvidenceError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "daily" => Ok(LogType::Daily),
            "activity" => Ok(LogType::Activity),
            other => Err(EvidenceError::Validation(format!(
                "log type must be \"daily\" or \"activity\" (got {other:?})"
            ))),
        }
    }
}

/// Why a finalized log was corrected.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCategory {
    TypoCorrection,
    MissingDetail,
    LateEntry,
    Clarification,
    IncorrectValue,
    Other,
}

impl ReasonCategory {
    pub const ALL: [ReasonCategory; 6] = [
        ReasonCategory::TypoCorrection,
        ReasonCategory::MissingDetail,
        ReasonCategory::LateEntry,
        ReasonCategory::Clarification,
        ReasonCategory::IncorrectValue,
        ReasonCategory::Other,
    ];

    /// Return the stable string identifier used in JSON artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCategory::TypoCorrection => "typo_correction",
            ReasonCategory::MissingDetail => "missing_detail",
            ReasonCategory::LateEntry => "late_entry",
            ReasonCategory::Clarification => "clarification",
            ReasonCategory::IncorrectValue => "incorrect_value",
            ReasonCategory::Other => "other",
        }
    }

    /// Human-readable label for revision history displays.
    pub fn label(&self) -> &'static str {
        match self {
            ReasonCategory::TypoCorrection => "Typo correction",
            ReasonCategory::MissingDetail => "Added missing detail",
            ReasonCategory::LateEntry => "Late entry",
            ReasonCategory::Clarification => "Clarification",
            ReasonCategory::IncorrectValue => "Corrected incorrect value",
            ReasonCategory::Other => "Other",
        }
    }
}

impl fmt::Display for ReasonCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReasonCategory {
    type Err = EvidenceError;

    fn from_str(value: &str) -> Result<Self> {
        ReasonCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
            .ok_or_else(|| {
                EvidenceError::Validation(format!("unknown reason category {value:?}"))
            })
    }
}

/// Installation-wide evidence mode flag.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct EvidenceModeConfig {
    pub enabled: bool,
    pub enabled_at: Option<EpochMs>,
    pub enabled_by: Option<String>,
}

/// Marker that a log has left the draft state for good.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LogFinalization {
    pub log_id: String,
    pub log_type: LogType,
    pub finalized_at: EpochMs,
    pub finalized_by: String,
}

/// One append-only correction to a finalized log.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RevisionRecord {
    pub id: String,
    pub log_id: String,
    pub log_type: LogType,
    pub profile_id: String,
    /// Descriptive label only; updates always replace the whole log.
    pub field_path: String,
    pub original_value: Value,
    pub updated_value: Value,
    #[serde(default)]
    pub original_snapshot: Option<Value>,
    pub reason_category: ReasonCategory,
    #[serde(default)]
    pub reason_note: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    pub revision_timestamp: EpochMs,
}

/// Audit figures frozen into a pack when it is created.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct GenerationMetadata {
    pub evidence_mode_enabled: bool,
    pub total_revisions: usize,
}

/// Immutable bundle of finalized logs prepared for sharing.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct SubmissionPack {
    pub id: String,
    pub profile_id: String,
    pub title: String,
    pub start_date: String,
    pub end_date: String,
    pub included_daily_log_ids: Vec<String>,
    pub included_activity_log_ids: Vec<String>,
    pub included_report_ids: Vec<String>,
    pub app_version: String,
    pub generation_metadata: GenerationMetadata,
    pub created_at: EpochMs,
}

/// Current epoch time in milliseconds for record timestamps.
pub fn now_epoch_ms() -> anyhow::Result<EpochMs> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("compute timestamp")?
        .as_millis();
    EpochMs::try_from(millis).context("timestamp overflows u64 milliseconds")
}

/// Build a record id that is unique within its collection.
///
/// `seq` is the 1-based position the record will occupy; collections only grow,
/// so the pair never repeats.
pub(crate) fn record_id(prefix: &str, seq: usize, ts: EpochMs) -> String {
    format!("{prefix}-{seq:06}-{ts}")
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
