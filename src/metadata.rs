//! Per-tag tuple layout of the data crossing a shuffle.
//!
//! Tasks on both sides of a boundary serialize and deserialize tuples with the value
//! types and key columns the query compiler attached to the plan. Which node carries
//! the layout depends on the side the task runs on and on the shape of the boundary.

use datafusion::arrow::datatypes::DataType;

use crate::{
    plan::{NodeId, PlanTree},
    result::{malformed_plan_err, Result},
    vocab::KeyIndexes,
};

/// Side of a shuffle boundary a task executes on. Handed down by task bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRole {
    /// Pre-shuffle side, emits into the shuffle.
    Producer,
    /// Post-shuffle side, reads the shuffled stream.
    Consumer,
}

/// Layout of one tag. Either part may be missing, in which case no (de)serialization
/// applies for that tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagMetadata {
    pub types: Option<Vec<DataType>>,
    pub key_indexes: Option<KeyIndexes>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShuffleMetadata {
    boundary: NodeId,
    multi_input: bool,
    tags: Vec<TagMetadata>,
}

impl ShuffleMetadata {
    /// The boundary the metadata was resolved for.
    pub fn boundary(&self) -> NodeId {
        self.boundary
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    pub fn is_multi_input(&self) -> bool {
        self.multi_input
    }

    pub fn types(&self, tag: usize) -> Option<&[DataType]> {
        self.tags.get(tag).and_then(|t| t.types.as_deref())
    }

    pub fn key_indexes(&self, tag: usize) -> Option<&KeyIndexes> {
        self.tags.get(tag).and_then(|t| t.key_indexes.as_ref())
    }
}

fn tag_of(plan: &PlanTree, node: NodeId, tag: usize) -> Result<TagMetadata> {
    let props = plan.props(node)?;
    Ok(TagMetadata {
        types: props.types(tag).map(<[DataType]>::to_vec),
        key_indexes: props.key_indexes(tag).cloned(),
    })
}

/// Resolves the shuffle layout a task running `plan` on the `role` side works with.
///
/// The boundary is the first one found descending through last children. Returns
/// `None` when there is none: the task is part of the terminal stage and only ordinary
/// output serialization applies.
///
/// | role     | boundary                  | layout taken from                      |
/// |----------|---------------------------|----------------------------------------|
/// | consumer | at most one branch        | the boundary, tag 0                    |
/// | consumer | `M` branches              | the boundary's parent, tags `0..M`     |
/// | producer | `M >= 1` branches         | branch `i`, tag `i`                    |
/// | producer | no local branch           | the absolute root, tag 0               |
pub fn resolve(plan: &PlanTree, role: TaskRole) -> Result<Option<ShuffleMetadata>> {
    let Some(boundary) = plan.find_boundary(plan.root())? else {
        return Ok(None);
    };
    let branches = plan.children(boundary)?;
    let multi_input = branches.len() > 1;

    let tags = match role {
        TaskRole::Consumer if !multi_input => vec![tag_of(plan, boundary, 0)?],
        TaskRole::Consumer => {
            let parent = plan.parent(boundary)?.ok_or_else(|| {
                malformed_plan_err(format!("join boundary {boundary} has no enclosing phase"))
            })?;
            (0..branches.len())
                .map(|tag| tag_of(plan, parent, tag))
                .collect::<Result<Vec<_>>>()?
        }
        TaskRole::Producer if branches.is_empty() => {
            vec![tag_of(plan, plan.absolute_root(boundary)?, 0)?]
        }
        TaskRole::Producer => branches
            .iter()
            .enumerate()
            .map(|(tag, branch)| tag_of(plan, *branch, tag))
            .collect::<Result<Vec<_>>>()?,
    };

    Ok(Some(ShuffleMetadata {
        boundary,
        multi_input,
        tags,
    }))
}

/// Layout a post-shuffle task uses when forwarding its output into the shuffle of a
/// later job. It is read from the plan's absolute root at `tag`, the job's
/// [crate::JobPlan::output_tag]; entries below `tag` are left empty. `None` for the
/// final job.
pub fn resolve_forwarded(plan: &PlanTree, tag: usize) -> Result<Option<ShuffleMetadata>> {
    let root = plan.root();
    if plan.kind(root)?.is_terminal() {
        return Ok(None);
    }
    let boundary = plan.find_boundary(root)?.unwrap_or(root);
    let mut tags = vec![TagMetadata::default(); tag];
    tags.push(tag_of(plan, root, tag)?);
    Ok(Some(ShuffleMetadata {
        boundary,
        multi_input: false,
        tags,
    }))
}
