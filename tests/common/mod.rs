#![allow(dead_code)]

use mapreduce_planner::test_utils::plans::{add_boundary, add_branch, terminal};
use mapreduce_planner::{NodeId, NodeKind, NodeProperties, PlanTree, Result};

/// Shape of the part of a plan that hangs below the terminal marker.
#[derive(Debug, Clone)]
pub enum Shape {
    Scan,
    /// Single-input shuffle above the inner shape.
    Chain(Box<Shape>),
    /// Multi-input shuffle, one branch per inner shape.
    Join(Vec<Shape>),
}

impl Shape {
    pub fn chain(inner: Shape) -> Self {
        Shape::Chain(Box::new(inner))
    }

    /// Number of jobs a plan of this shape decomposes into.
    pub fn expected_jobs(&self) -> usize {
        self.boundary_jobs().max(1)
    }

    fn boundary_jobs(&self) -> usize {
        match self {
            Shape::Scan => 0,
            Shape::Chain(inner) => 1 + inner.boundary_jobs(),
            // a branch without a boundary of its own still runs as a job
            Shape::Join(branches) => {
                1 + branches
                    .iter()
                    .map(|b| b.boundary_jobs().max(1))
                    .sum::<usize>()
            }
        }
    }

    pub fn plan(&self) -> Result<PlanTree> {
        let (mut plan, end) = terminal()?;
        let mut next_input = 0;
        self.build(&mut plan, end, &mut next_input)?;
        Ok(plan)
    }

    fn build(&self, plan: &mut PlanTree, parent: NodeId, next_input: &mut usize) -> Result<()> {
        match self {
            Shape::Scan => {
                let input = *next_input;
                *next_input += 1;
                plan.add_child(parent, NodeKind::Scan { input }, NodeProperties::default())?;
            }
            Shape::Chain(inner) => {
                let shuffle = add_boundary(plan, parent, 1)?;
                let branch = add_branch(plan, shuffle, 0)?;
                inner.build(plan, branch, next_input)?;
            }
            Shape::Join(branches) => {
                let shuffle = add_boundary(plan, parent, branches.len())?;
                for (tag, inner) in branches.iter().enumerate() {
                    let branch = add_branch(plan, shuffle, tag)?;
                    inner.build(plan, branch, next_input)?;
                }
            }
        }
        Ok(())
    }
}

/// Every shape nesting chains and 2/3-way joins up to `depth` levels.
pub fn shapes(depth: usize) -> Vec<Shape> {
    if depth == 0 {
        return vec![Shape::Scan];
    }
    let smaller = shapes(depth - 1);
    let mut out = smaller.clone();
    for inner in &smaller {
        out.push(Shape::chain(inner.clone()));
    }
    for left in &smaller {
        for right in &smaller {
            out.push(Shape::Join(vec![left.clone(), right.clone()]));
        }
        out.push(Shape::Join(vec![left.clone(), Shape::Scan, Shape::Scan]));
    }
    out
}

fn operator(plan: &mut PlanTree, parent: NodeId, name: &str) -> Result<NodeId> {
    plan.add_child(parent, NodeKind::Operator(name.into()), NodeProperties::default())
}

/// `scan(L) -> group-by(k) -> aggregate(sum)` with the group-by as its only boundary.
pub fn group_by_plan() -> Result<PlanTree> {
    let (mut plan, end) = terminal()?;
    let aggregate = operator(&mut plan, end, "aggregate")?;
    let shuffle = add_boundary(&mut plan, aggregate, 1)?;
    let branch = add_branch(&mut plan, shuffle, 0)?;
    let group_by = operator(&mut plan, branch, "group-by")?;
    plan.add_child(group_by, NodeKind::Scan { input: 0 }, NodeProperties::default())?;
    Ok(plan)
}

/// [group_by_plan] whose aggregated result is re-shuffled to be ordered.
pub fn group_by_ordered_plan() -> Result<PlanTree> {
    let (mut plan, end) = terminal()?;
    let sort = operator(&mut plan, end, "sort")?;
    let order_by = add_boundary(&mut plan, sort, 1)?;
    let branch = add_branch(&mut plan, order_by, 0)?;
    let aggregate = operator(&mut plan, branch, "aggregate")?;
    let group_by = add_boundary(&mut plan, aggregate, 1)?;
    let branch = add_branch(&mut plan, group_by, 0)?;
    let prepare = operator(&mut plan, branch, "group-by")?;
    plan.add_child(prepare, NodeKind::Scan { input: 0 }, NodeProperties::default())?;
    Ok(plan)
}

/// `scan(L) join scan(O) on key -> group-by(key)`, the group-by sharing the join's
/// partitioning and thus its boundary.
pub fn join_group_by_plan() -> Result<PlanTree> {
    let (mut plan, end) = terminal()?;
    let aggregate = operator(&mut plan, end, "aggregate")?;
    let join = add_boundary(&mut plan, aggregate, 2)?;
    for tag in 0..2 {
        let branch = add_branch(&mut plan, join, tag)?;
        plan.add_child(branch, NodeKind::Scan { input: tag }, NodeProperties::default())?;
    }
    Ok(plan)
}
