//! Evidence-integrity core for personal health and function logs.
//!
//! Logs start as drafts and can be finalized once. A finalized log is changed
//! only through an append-only revision ledger, and submission packs freeze
//! their audit figures at creation.
pub mod config;
pub mod error;
pub mod finalization;
pub mod logs;
pub mod orchestrator;
pub mod packs;
pub mod paths;
pub mod policy;
pub mod revisions;
pub mod store;
pub mod types;

pub use error::{EvidenceError, Result};
pub use orchestrator::{
    EvidenceService, ModifyCheck, RevisionOutcome, RevisionRequest, SaveOutcome,
};
pub use packs::PackRequest;
pub use types::{
    EvidenceModeConfig, GenerationMetadata, LogFinalization, LogType, ReasonCategory,
    RevisionRecord, SubmissionPack,
};
