use std::sync::Arc;

use anyhow::anyhow;
use futures::TryStreamExt;
use object_store::{path::Path, ObjectStore};

use super::{output_location, ExecutionRuntime, JobConf, JobRegistry, JobStatus};
use crate::{
    config::MrConfig,
    decompose::JobPlan,
    logging::{debug, info},
    result::{aborted_err, Result},
    splits::SplitAssigner,
    vocab::{StaticContext, Tuple},
};

/// Submits job plans to the execution runtime, one at a time, and blocks until they
/// complete.
pub struct JobDriver {
    runtime: Arc<dyn ExecutionRuntime>,
    store: Arc<dyn ObjectStore>,
    base: Path,
    ctx: Arc<StaticContext>,
    registry: Arc<JobRegistry>,
    delete_existing: bool,
    assigner: Option<SplitAssigner>,
}

impl JobDriver {
    pub fn new(
        runtime: Arc<dyn ExecutionRuntime>,
        store: Arc<dyn ObjectStore>,
        base: Path,
        ctx: Arc<StaticContext>,
    ) -> Self {
        Self {
            runtime,
            store,
            base,
            ctx,
            registry: Arc::new(JobRegistry::new()),
            delete_existing: false,
            assigner: None,
        }
    }

    /// Driver writing under the output location configured in `cfg`.
    pub fn try_from_config(
        cfg: &MrConfig,
        runtime: Arc<dyn ExecutionRuntime>,
        ctx: Arc<StaticContext>,
    ) -> Result<Self> {
        let (store, base) = cfg.output_store()?;
        Ok(Self::new(runtime, store, base, ctx).with_delete_existing(cfg.delete_existing))
    }

    /// Deletes existing data under a job's output location before submitting the job.
    pub fn with_delete_existing(mut self, delete_existing: bool) -> Self {
        self.delete_existing = delete_existing;
        self
    }

    /// Resolves the physical splits of the logical inputs before submitting a job.
    pub fn with_split_assigner(mut self, assigner: SplitAssigner) -> Self {
        self.assigner = Some(assigner);
        self
    }

    pub fn with_registry(mut self, registry: Arc<JobRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Base location job outputs are written under.
    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Runs `job` to completion.
    ///
    /// Any failure while submitting or awaiting the job, as well as a final state other
    /// than success, is reported as [crate::MrError::Aborted]. Nothing is retried.
    pub async fn run_job(&self, job: &JobPlan, tuple: Option<&Tuple>) -> Result<()> {
        let mut conf = JobConf::try_new(job, self.ctx.clone(), tuple.cloned(), &self.base)?;
        if let Some(assigner) = &self.assigner {
            let splits = assigner.assign_indexed(&conf.logical_inputs()).await?;
            conf.splits = splits;
        }

        let output = output_location(&self.base, job.seq);
        if self.delete_existing {
            self.delete_output(&output).await?;
        }

        info!("Submitting {}", job.name_with_inputs());
        let id = self
            .runtime
            .submit(conf)
            .await
            .map_err(|e| aborted_err(job.seq, e))?;
        self.registry.register(job.seq, id.clone());
        debug!("{} submitted as {id} ({})", job.name(), self.registry.progress());

        let status = self
            .runtime
            .wait_for_completion(&id)
            .await
            .map_err(|e| aborted_err(job.seq, e))?;
        match status {
            JobStatus::Succeeded => {
                info!("{} completed, output at {output}", job.name());
                Ok(())
            }
            JobStatus::Failed(reason) => Err(aborted_err(
                job.seq,
                anyhow!("job {id} failed: {reason}"),
            )),
            JobStatus::Killed => Err(aborted_err(job.seq, anyhow!("job {id} was killed"))),
        }
    }

    /// Deletes everything stored under `output`. A location that does not exist is fine.
    async fn delete_output(&self, output: &Path) -> Result<()> {
        let existing: Vec<_> = match self.store.list(Some(output)).try_collect::<Vec<_>>().await {
            Ok(existing) => existing,
            Err(object_store::Error::NotFound { .. }) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if !existing.is_empty() {
            log::warn!("Deleting {} existing objects under {output}", existing.len());
        }
        for meta in existing {
            match self.store.delete(&meta.location).await {
                Ok(()) | Err(object_store::Error::NotFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
