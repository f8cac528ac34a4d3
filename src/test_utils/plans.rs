use datafusion::arrow::datatypes::DataType;

use crate::plan::{NodeId, NodeKind, NodeProperties, PlanTree};
use crate::result::Result;

/// Tuple layout every builder in this module attaches to its phase markers: a string
/// key followed by an integer payload, keyed on the first column.
pub fn tuple_types() -> Vec<DataType> {
    vec![DataType::Utf8, DataType::Int64]
}

fn tagged(tags: usize) -> NodeProperties {
    (0..tags).fold(NodeProperties::default(), |props, tag| {
        props.with_tag(tag, tuple_types(), [0])
    })
}

fn tagged_at(tag: usize) -> NodeProperties {
    NodeProperties::default().with_tag(tag, tuple_types(), [0])
}

/// Terminal plan stem: `End` with a `return` operator as its first child. Returns the
/// tree and the `End` node to hang the rest of the pipeline under.
pub fn terminal() -> Result<(PlanTree, NodeId)> {
    let mut plan = PlanTree::new(NodeKind::End, NodeProperties::default());
    let end = plan.root();
    plan.add_child(end, NodeKind::Operator("return".into()), NodeProperties::default())?;
    Ok((plan, end))
}

/// Appends `PhaseIn -> Shuffle` below `parent` with `branches` producing branches
/// worth of metadata, returning the shuffle.
pub fn add_boundary(plan: &mut PlanTree, parent: NodeId, branches: usize) -> Result<NodeId> {
    let phase_in = plan.add_child(parent, NodeKind::PhaseIn, tagged(branches))?;
    let shuffle_props = if branches <= 1 {
        tagged(1)
    } else {
        NodeProperties::default()
    };
    plan.add_child(phase_in, NodeKind::Shuffle, shuffle_props)
}

/// Appends a producing branch to `shuffle` as its `tag`-th child.
pub fn add_branch(plan: &mut PlanTree, shuffle: NodeId, tag: usize) -> Result<NodeId> {
    plan.add_child(shuffle, NodeKind::PhaseOut, tagged_at(tag))
}

/// Linear plan with `boundaries` chained shuffles above a single scan of input 0.
///
/// ```text
/// End
///   return
///   PhaseIn
///     Shuffle
///       PhaseOut
///         ... repeated ...
///           Scan: input=0
/// ```
pub fn chain_plan(boundaries: usize) -> Result<PlanTree> {
    let (mut plan, mut parent) = terminal()?;
    for _ in 0..boundaries {
        let shuffle = add_boundary(&mut plan, parent, 1)?;
        parent = add_branch(&mut plan, shuffle, 0)?;
    }
    plan.add_child(parent, NodeKind::Scan { input: 0 }, NodeProperties::default())?;
    Ok(plan)
}

/// A single `ways`-way join shuffle whose i-th branch scans input i.
pub fn join_plan(ways: usize) -> Result<PlanTree> {
    let (mut plan, end) = terminal()?;
    let shuffle = add_boundary(&mut plan, end, ways)?;
    for tag in 0..ways {
        let branch = add_branch(&mut plan, shuffle, tag)?;
        plan.add_child(branch, NodeKind::Scan { input: tag }, NodeProperties::default())?;
    }
    Ok(plan)
}
