use itertools::Itertools;

use crate::{
    plan::{NodeId, NodeKind, PlanTree},
    result::Result,
    vocab::Seq,
};

/// A unit of work that can be submitted to the cluster as one batch job.
///
/// It owns the plan subtree that was cut out of the original plan at a shuffle
/// boundary. Leaves standing in for the output of earlier jobs are placeholders
/// carrying the producing job's sequence number.
#[derive(Debug, Clone)]
pub struct JobPlan {
    /// Position of this job in submission order
    pub seq: Seq,
    /// The detached plan subtree this job executes
    pub plan: PlanTree,
    boundary: Option<NodeId>,
    multi_input: bool,
    output_tag: usize,
    inputs: Vec<Seq>,
    logical_inputs: Vec<usize>,
}

impl JobPlan {
    /// Creates a job plan and collects what it reads from: earlier jobs referenced by
    /// placeholders, and logical inputs referenced by scans.
    pub fn try_new(seq: Seq, plan: PlanTree) -> Result<Self> {
        let boundary = plan.find_boundary(plan.root())?;
        let multi_input = match boundary {
            Some(b) => plan.children(b)?.len() > 1,
            None => false,
        };

        let mut inputs = vec![];
        let mut logical_inputs = vec![];
        for id in plan.descendants(plan.root())? {
            let node = plan.node(id)?;
            if let Some(input_seq) = node.props.input_seq {
                inputs.push(input_seq);
            } else if let NodeKind::Scan { input } = node.kind {
                logical_inputs.push(input);
            }
        }

        Ok(Self {
            seq,
            plan,
            boundary,
            multi_input,
            output_tag: 0,
            inputs: inputs.into_iter().sorted().dedup().collect(),
            logical_inputs: logical_inputs.into_iter().sorted().dedup().collect(),
        })
    }

    /// Sets the position this job's plan held below the boundary consuming its output.
    pub fn with_output_tag(mut self, tag: usize) -> Self {
        self.output_tag = tag;
        self
    }

    pub fn name(&self) -> String {
        format!("Job {}", self.seq)
    }

    /// The shuffle this job's map and reduce phases are separated by, if any.
    pub fn boundary(&self) -> Option<NodeId> {
        self.boundary
    }

    /// Whether the job's shuffle merges more than one producing branch.
    pub fn is_multi_input(&self) -> bool {
        self.multi_input
    }

    /// Tag the job's output carries in the shuffle of the job reading it. Non-zero only
    /// for the branches of a multi-input boundary.
    pub fn output_tag(&self) -> usize {
        self.output_tag
    }

    /// Sequence numbers of the jobs whose output this job reads, ascending.
    pub fn inputs(&self) -> &[Seq] {
        &self.inputs
    }

    /// Positions of the declared logical inputs this job scans, ascending.
    pub fn logical_inputs(&self) -> &[usize] {
        &self.logical_inputs
    }

    /// Returns the name of this job including the jobs it reads from, if any.
    pub fn name_with_inputs(&self) -> String {
        if self.inputs.is_empty() {
            self.name()
        } else {
            format!("{} Input Jobs:[{}]", self.name(), self.inputs.iter().join(", "))
        }
    }
}
