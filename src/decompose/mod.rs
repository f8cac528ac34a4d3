mod job_plan;

use std::collections::VecDeque;

pub use job_plan::JobPlan;

use crate::{
    logging::{debug, trace},
    plan::{NodeId, PlanTree},
    result::{malformed_plan_err, Result},
    vocab::Seq,
};

/// Tree of the shuffle boundaries of a plan.
///
/// Each node mirrors one boundary and has one child per boundary reachable below it.
/// Every branch of a multi-input boundary is a child as well: a branch without a
/// boundary of its own becomes a job that only feeds the join, so `node` then points
/// at the root of that branch instead of at a boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryTree {
    pub node: NodeId,
    pub children: Vec<BoundaryTree>,
}

impl BoundaryTree {
    /// Builds the boundary tree of `plan`. Returns `None` if no boundary is reachable, in
    /// which case the whole plan runs as a single job.
    pub fn build(plan: &PlanTree) -> Result<Option<BoundaryTree>> {
        Self::build_from(plan, plan.root())
    }

    fn build_from(plan: &PlanTree, start: NodeId) -> Result<Option<BoundaryTree>> {
        // outside of boundaries plans are last-child deep
        let Some(boundary) = plan.find_boundary(start)? else {
            return Ok(None);
        };

        let branches = plan.children(boundary)?;
        let multi_input = branches.len() > 1;
        let mut children = Vec::with_capacity(branches.len());
        for branch in branches {
            match Self::build_from(plan, *branch)? {
                Some(child) => children.push(child),
                None if multi_input => children.push(BoundaryTree {
                    node: *branch,
                    children: vec![],
                }),
                None => {}
            }
        }

        Ok(Some(BoundaryTree {
            node: boundary,
            children,
        }))
    }

    /// Number of jobs this tree decomposes into.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(|c| c.size()).sum::<usize>()
    }

    /// Nodes in extraction order: all children, depth-first, before their parent.
    fn extraction_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.size());
        self.collect_post_order(&mut out);
        out
    }

    fn collect_post_order(&self, out: &mut Vec<NodeId>) {
        for child in &self.children {
            child.collect_post_order(out);
        }
        out.push(self.node);
    }
}

/// Decomposes a plan into the ordered sequence of jobs that reproduces its result.
///
/// Jobs are extracted lazily, one per call to [Iterator::next], so a caller can run
/// job `n` to completion before job `n + 1` is cut out of the residual plan. Each
/// extracted subtree is replaced in its enclosing boundary by a placeholder carrying
/// the job's sequence number, or dropped when nothing downstream consumes it.
pub struct Decomposition {
    residual: Option<PlanTree>,
    pending: VecDeque<NodeId>,
    next_seq: Seq,
    job_count: usize,
}

impl Decomposition {
    pub fn new(plan: PlanTree) -> Result<Self> {
        let pending: VecDeque<NodeId> = match BoundaryTree::build(&plan)? {
            Some(tree) => tree.extraction_order().into(),
            None => VecDeque::new(),
        };
        let job_count = pending.len().max(1);
        debug!("Decomposing plan into {job_count} jobs");

        Ok(Self {
            residual: Some(plan),
            pending,
            next_seq: 0,
            job_count,
        })
    }

    /// Total number of jobs this decomposition yields.
    pub fn job_count(&self) -> usize {
        self.job_count
    }

    fn next_job(&mut self) -> Result<Option<JobPlan>> {
        let Some(residual) = self.residual.as_mut() else {
            return Ok(None);
        };
        let seq = self.next_seq;

        let (detached, output_tag) = match self.pending.pop_front() {
            Some(node) => extract(residual, node, seq)?,
            // plan without any boundary, the whole thing is a single job
            None => {
                let plan = self
                    .residual
                    .take()
                    .ok_or_else(|| malformed_plan_err("residual plan already consumed"))?;
                (plan, 0)
            }
        };
        if self.pending.is_empty() {
            self.residual = None;
        }

        self.next_seq += 1;
        let job = JobPlan::try_new(seq, detached)?.with_output_tag(output_tag);
        debug!("Extracted {}", job.name_with_inputs());
        trace!("{} plan:\n{}", job.name(), job.plan);
        Ok(Some(job))
    }
}

impl Iterator for Decomposition {
    type Item = Result<JobPlan>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_job() {
            Ok(job) => job.map(Ok),
            Err(e) => {
                // a malformed plan leaves the residual in an unknown state
                self.residual = None;
                self.pending.clear();
                Some(Err(e))
            }
        }
    }
}

/// Cuts the job rooted around `node` out of `plan`.
///
/// Walks up from `node` until the parent is a boundary, in which case the subtree is
/// replaced by a placeholder at the same position, or until the terminal marker is
/// reached, in which case the subtree is removed altogether. Also returns the position
/// the subtree held below its boundary, which is the tag its output is shuffled with.
fn extract(plan: &mut PlanTree, node: NodeId, seq: Seq) -> Result<(PlanTree, usize)> {
    let mut top = node;
    loop {
        let parent = plan.parent(top)?;
        if let Some(parent) = parent {
            if plan.kind(parent)?.is_boundary() {
                let index = plan.child_index(top)?;
                let placeholder = plan.placeholder(top, seq)?;
                plan.replace_child(parent, index, placeholder)?;
                trace!("Replaced {top} with placeholder for job {seq} at position {index} of {parent}");
                return Ok((plan.detach(top)?, index));
            }
        }
        if plan.kind(top)?.is_terminal() {
            return Ok((plan.detach(top)?, 0));
        }
        match parent {
            Some(parent) => top = parent,
            None => {
                return Err(malformed_plan_err(format!(
                    "boundary {node} is not reachable from a terminal marker"
                )))
            }
        }
    }
}

/// Decomposes `plan` into all of its jobs at once.
pub fn decompose(plan: PlanTree) -> Result<Vec<JobPlan>> {
    Decomposition::new(plan)?.collect()
}
