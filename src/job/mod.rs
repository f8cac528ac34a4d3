mod driver;
mod registry;
mod runtime;

use std::sync::Arc;

use object_store::path::Path;

pub use driver::JobDriver;
pub use registry::{JobRegistry, Progress};
pub use runtime::{ExecutionRuntime, JobStatus};

use crate::{
    decompose::JobPlan,
    plan::PlanTree,
    result::{malformed_plan_err, Result},
    splits::{LogicalInput, SplitRecord},
    vocab::{Seq, StaticContext, Tuple},
};

/// Where job `seq` writes its output. Placeholders referencing job `seq` read from
/// the very same location, nothing else needs to be tracked between jobs.
pub fn output_location(base: &Path, seq: Seq) -> Path {
    base.child(format!("job-{seq}"))
}

/// Something a job reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobInput {
    /// Output of an earlier job of the same evaluation.
    Job { seq: Seq, location: Path },
    /// A declared logical input, `index` being its position in the static context.
    Logical { index: usize, input: LogicalInput },
}

/// Everything the execution runtime needs to run one job.
#[derive(Debug, Clone)]
pub struct JobConf {
    pub seq: Seq,
    pub name: String,
    /// The job plan subtree every task of the job evaluates.
    pub plan: PlanTree,
    pub ctx: Arc<StaticContext>,
    /// Outer tuple of a correlated evaluation.
    pub tuple: Option<Tuple>,
    pub inputs: Vec<JobInput>,
    pub output: Path,
    /// Tag the output is written with, see [JobPlan::output_tag].
    pub output_tag: usize,
    pub multi_input: bool,
    /// Physical splits of the logical inputs, empty until assigned.
    pub splits: Vec<SplitRecord>,
}

impl JobConf {
    pub fn try_new(
        job: &JobPlan,
        ctx: Arc<StaticContext>,
        tuple: Option<Tuple>,
        base: &Path,
    ) -> Result<Self> {
        let mut inputs = job
            .inputs()
            .iter()
            .map(|seq| JobInput::Job {
                seq: *seq,
                location: output_location(base, *seq),
            })
            .collect::<Vec<_>>();
        for index in job.logical_inputs() {
            let input = ctx.input(*index).ok_or_else(|| {
                malformed_plan_err(format!(
                    "{} scans input {index}, but only {} inputs are declared",
                    job.name(),
                    ctx.inputs.len()
                ))
            })?;
            inputs.push(JobInput::Logical {
                index: *index,
                input: input.clone(),
            });
        }

        Ok(Self {
            seq: job.seq,
            name: job.name_with_inputs(),
            plan: job.plan.clone(),
            ctx,
            tuple,
            inputs,
            output: output_location(base, job.seq),
            output_tag: job.output_tag(),
            multi_input: job.is_multi_input(),
            splits: vec![],
        })
    }

    /// Declared logical inputs of this job with their static context position.
    pub fn logical_inputs(&self) -> Vec<(usize, &LogicalInput)> {
        self.inputs
            .iter()
            .filter_map(|input| match input {
                JobInput::Logical { index, input } => Some((*index, input)),
                JobInput::Job { .. } => None,
            })
            .collect()
    }
}
