use std::{collections::HashMap, sync::Arc};

use anyhow::anyhow;
use async_trait::async_trait;
use object_store::ObjectStore;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::job::{ExecutionRuntime, JobConf, JobStatus};
use crate::result::Result;
use crate::vocab::{JobId, Seq};

/// [ExecutionRuntime] that completes jobs instantly, without running them.
///
/// Every submitted [JobConf] is kept for inspection. When a store is given, a
/// successful job leaves a single `part-0` object under its output location.
#[derive(Debug, Default)]
pub struct InMemoryRuntime {
    store: Option<Arc<dyn ObjectStore>>,
    failing: Option<Seq>,
    rejected: Option<Seq>,
    submitted: Mutex<Vec<JobConf>>,
    jobs: Mutex<HashMap<JobId, JobConf>>,
}

impl InMemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Job `seq` is accepted but completes with a failure.
    pub fn with_failing_job(mut self, seq: Seq) -> Self {
        self.failing = Some(seq);
        self
    }

    /// Submission of job `seq` errors out.
    pub fn with_rejected_job(mut self, seq: Seq) -> Self {
        self.rejected = Some(seq);
        self
    }

    /// Configurations of the accepted jobs, in submission order.
    pub fn submitted(&self) -> Vec<JobConf> {
        self.submitted.lock().clone()
    }
}

#[async_trait]
impl ExecutionRuntime for InMemoryRuntime {
    async fn submit(&self, conf: JobConf) -> Result<JobId> {
        if self.rejected == Some(conf.seq) {
            return Err(anyhow!("cluster refused {}", conf.name).into());
        }
        let id = JobId(format!("job_{}", Uuid::new_v4()));
        self.submitted.lock().push(conf.clone());
        self.jobs.lock().insert(id.clone(), conf);
        Ok(id)
    }

    async fn wait_for_completion(&self, id: &JobId) -> Result<JobStatus> {
        let Some(conf) = self.jobs.lock().get(id).cloned() else {
            return Err(anyhow!("unknown job {id}").into());
        };
        if self.failing == Some(conf.seq) {
            return Ok(JobStatus::Failed("task attempts exhausted".to_string()));
        }
        if let Some(store) = &self.store {
            store
                .put(&conf.output.child("part-0"), conf.name.into_bytes().into())
                .await?;
        }
        Ok(JobStatus::Succeeded)
    }
}
