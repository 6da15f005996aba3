//! Error taxonomy for the evidence core.
//!
//! Collaborators report failures as `anyhow::Error`; the core wraps them so
//! callers can branch on the kind of failure without string matching.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvidenceError {
    /// A second finalize was attempted for a log that is already finalized.
    #[error("log {log_id} is already finalized")]
    AlreadyFinalized { log_id: String },

    /// Caller input failed policy. The message is shown to the user verbatim.
    #[error("{0}")]
    Validation(String),

    /// The durable write (or read) for a collection failed.
    #[error("persistence failed for {key}: {source:#}")]
    Persistence {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The revision was recorded but the live log update failed afterwards.
    #[error(
        "revision {revision_id} was recorded but log {log_id} was not updated; reconcile: {source:#}"
    )]
    ReconciliationRequired {
        log_id: String,
        revision_id: String,
        #[source]
        source: anyhow::Error,
    },
}

impl EvidenceError {
    pub(crate) fn persistence(key: &str, source: anyhow::Error) -> Self {
        EvidenceError::Persistence {
            key: key.to_string(),
            source,
        }
    }

    pub(crate) fn not_found(kind: &'static str, id: &str) -> Self {
        EvidenceError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// True when the failure came from storage and a retry prompt makes sense.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EvidenceError::Persistence { .. })
    }
}

pub type Result<T> = std::result::Result<T, EvidenceError>;
