use std::fmt::{Display, Formatter, Write};

use crate::{
    decompose::JobPlan,
    plan::{NodeId, PlanNode, PlanTree},
    result::Result,
};

impl Display for PlanNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            super::NodeKind::Scan { input } => write!(f, "Scan: input={input}")?,
            kind => write!(f, "{}", kind.name())?,
        }
        if let Some(seq) = self.props.input_seq {
            write!(f, " <- job {seq}")?;
        }
        Ok(())
    }
}

/// Indented rendering, one node per line, children below their parent.
impl Display for PlanTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return writeln!(f, "<empty>");
        }
        let mut stack = vec![(self.root(), 0)];
        while let Some((id, depth)) = stack.pop() {
            let node = self.node(id).map_err(|_| std::fmt::Error)?;
            writeln!(f, "{}{}", "  ".repeat(depth), node)?;
            for child in node.children().iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        Ok(())
    }
}

/// Renders the jobs of a decomposition as a Graphviz digraph. Every job is a cluster,
/// edges inside a cluster follow the plan, and an edge between clusters goes from the
/// producing job's root to the placeholder reading its output.
pub fn display_jobs_graphviz(jobs: &[JobPlan]) -> Result<String> {
    let mut f = String::new();

    writeln!(
        f,
        "digraph G {{
  rankdir=BT
"
    )?;

    for job in jobs {
        f.push_str(&display_single_job(job)?);
    }

    for job in jobs {
        for id in job.plan.descendants(job.plan.root())? {
            let Some(input_seq) = job.plan.props(id)?.input_seq else {
                continue;
            };
            let Some(producer) = jobs.iter().find(|j| j.seq == input_seq) else {
                continue;
            };
            writeln!(
                f,
                "  {} -> {} [style=dashed]",
                node_name(producer, producer.plan.root()),
                node_name(job, id)
            )?;
        }
    }

    writeln!(f, "}}")?;
    Ok(f)
}

fn display_single_job(job: &JobPlan) -> Result<String> {
    let mut f = String::new();
    let color = if job.is_multi_input() { "red" } else { "blue" };
    writeln!(
        f,
        "  subgraph \"cluster_job_{}\" {{
    color={}
    style=dotted
    label = \"{}\"",
        job.seq,
        color,
        job.name_with_inputs()
    )?;

    for id in job.plan.descendants(job.plan.root())? {
        let node = job.plan.node(id)?;
        let shape = if node.kind.is_boundary() { "diamond" } else { "box" };
        writeln!(
            f,
            "    {} [label=\"{}\" shape={}]",
            node_name(job, id),
            node,
            shape
        )?;
        for child in node.children() {
            writeln!(f, "    {} -> {}", node_name(job, *child), node_name(job, id))?;
        }
    }

    writeln!(f, "  }}")?;
    Ok(f)
}

fn node_name(job: &JobPlan, id: NodeId) -> String {
    format!("job_{}_node_{}", job.seq, id.index())
}
