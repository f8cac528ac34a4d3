use async_trait::async_trait;

use super::JobConf;
use crate::{result::Result, vocab::JobId};

/// Final state of a job as reported by the execution runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Succeeded,
    Failed(String),
    Killed,
}

/// The cluster's batch job API. Retries, if any, are its business.
#[async_trait]
pub trait ExecutionRuntime: Send + Sync {
    /// Submits a job and returns the identifier the runtime assigned to it.
    async fn submit(&self, conf: JobConf) -> Result<JobId>;

    /// Resolves once the job reached a final state.
    async fn wait_for_completion(&self, id: &JobId) -> Result<JobStatus>;
}
