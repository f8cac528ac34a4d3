use datafusion::arrow::error::ArrowError;
use thiserror::Error;

use crate::vocab::Seq;

#[derive(Debug, Error)]
pub enum MrError {
    #[error("Internal Arrow error: {0}")]
    ArrowError(#[from] ArrowError),

    #[error("Internal DataFusion error: {0}")]
    DataFusionError(#[from] datafusion::error::DataFusionError),

    #[error("Object store error: {0}")]
    ObjectStoreError(#[from] object_store::Error),

    #[error("Formatting error: {0}")]
    FmtError(#[from] std::fmt::Error),

    #[error("Invalid plan description: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The plan handed over by the compiler violates a structural invariant. This is a
    /// defect upstream and never retried.
    #[error("Malformed plan: {0}")]
    MalformedPlan(String),

    /// A submitted job did not complete successfully. Aborts the whole evaluation.
    #[error("Execution of job {seq} aborted: {cause:#}")]
    Aborted { seq: Seq, cause: anyhow::Error },

    /// A path-rooted logical input for which no physical split was discovered.
    #[error("Declared input {index} ({name}) matched no splits under {path}")]
    UnmatchedInput {
        index: usize,
        name: String,
        path: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T, E = MrError> = std::result::Result<T, E>;

/// Builds a [MrError::MalformedPlan] error.
pub fn malformed_plan_err(msg: impl Into<String>) -> MrError {
    MrError::MalformedPlan(msg.into())
}

/// Builds a [MrError::Aborted] error for the job with sequence number `seq`.
pub fn aborted_err(seq: Seq, cause: impl Into<anyhow::Error>) -> MrError {
    MrError::Aborted {
        seq,
        cause: cause.into(),
    }
}

impl MrError {
    /// Whether this error stems from a malformed plan rather than from execution.
    pub fn is_plan_defect(&self) -> bool {
        matches!(self, MrError::MalformedPlan(_))
    }
}
