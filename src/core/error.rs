use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structural failures that abort a build step or a match run
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Invalid taxonomy: {0}")]
    InvalidTaxonomy(String),

    #[error("Empty candidate pool: no advisors supplied")]
    EmptyCandidatePool,

    #[error("Match worker failed: {0}")]
    Worker(String),
}

/// Per-record data problem; the record is skipped and the run continues
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataWarning {
    #[error("{owner}: unknown subtopic {subtopic_id}")]
    UnknownSubtopic { owner: String, subtopic_id: String },

    #[error("{owner}: subtopic {subtopic_id} is inactive")]
    InactiveSubtopic { owner: String, subtopic_id: String },

    #[error("{owner}: invalid value {value} for {field} in subtopic {subtopic_id}")]
    InvalidValue {
        owner: String,
        subtopic_id: String,
        field: String,
        /// Rendered as text so NaN and infinities survive JSON
        value: String,
    },

    #[error("{owner}: duplicate need for subtopic {subtopic_id}, keeping the first")]
    DuplicateNeed { owner: String, subtopic_id: String },

    #[error("duplicate advisor {advisor_id} in candidate pool, keeping the first")]
    DuplicateAdvisor { advisor_id: String },
}

impl DataWarning {
    /// Log at warn level and append to the collected warnings
    pub(crate) fn record(self, sink: &mut Vec<DataWarning>) {
        tracing::warn!("Skipping record: {}", self);
        sink.push(self);
    }
}
