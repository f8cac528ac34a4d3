use object_store::path::Path;

use crate::{
    decompose::Decomposition,
    job::{output_location, JobDriver},
    logging::{debug, info},
    plan::PlanTree,
    result::{malformed_plan_err, Result},
    vocab::{Seq, Tuple},
};

/// Outcome of a successful plan evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Sequence numbers of the jobs that ran, in submission order.
    pub jobs: Vec<Seq>,
    /// Where the final job wrote the result of the plan.
    pub output: Path,
}

/// Evaluates compiled plans as a sequence of cluster jobs.
pub struct PlanEvaluator {
    driver: JobDriver,
}

impl PlanEvaluator {
    pub fn new(driver: JobDriver) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &JobDriver {
        &self.driver
    }

    /// Decomposes `plan` and runs its jobs strictly one after the other. Job `n + 1` is
    /// only extracted once job `n` completed, and the first failure aborts the whole
    /// evaluation.
    pub async fn evaluate(&self, plan: PlanTree, tuple: Option<Tuple>) -> Result<Evaluation> {
        let decomposition = Decomposition::new(plan)?;
        self.driver.registry().reset(decomposition.job_count());
        info!("Evaluating plan as {} jobs", decomposition.job_count());

        let mut jobs = vec![];
        for job in decomposition {
            let job = job?;
            self.driver.run_job(&job, tuple.as_ref()).await?;
            debug!("{}", self.driver.registry().progress());
            jobs.push(job.seq);
        }

        let last = *jobs
            .last()
            .ok_or_else(|| malformed_plan_err("plan decomposed into no jobs"))?;
        Ok(Evaluation {
            jobs,
            output: output_location(self.driver.base(), last),
        })
    }
}
