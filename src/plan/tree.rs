use std::fmt::{Display, Formatter};

use datafusion::arrow::datatypes::DataType;

use crate::{
    result::{malformed_plan_err, Result},
    vocab::{KeyIndexes, Seq},
};

/// Handle to a node inside a [PlanTree]. Handles stay valid while the node is alive,
/// detaching or replacing other nodes never moves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn index(&self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Type tag of a plan node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Redistribution point (partition + sort). Children are the producing branches,
    /// more than one child means a multi-input join boundary.
    Shuffle,
    /// Terminal marker of a pipeline. Whatever hangs below it produces the final result.
    End,
    /// Start of the post-shuffle (consumer) phase.
    PhaseIn,
    /// End of a pre-shuffle (producer) phase, emits into the enclosing shuffle.
    PhaseOut,
    /// Reads the logical input declared at position `input` of the static context.
    Scan { input: usize },
    /// Any other operator of the compiled plan.
    Operator(String),
}

impl NodeKind {
    pub fn is_boundary(&self) -> bool {
        matches!(self, NodeKind::Shuffle)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeKind::End)
    }

    pub fn name(&self) -> &str {
        match self {
            NodeKind::Shuffle => "Shuffle",
            NodeKind::End => "End",
            NodeKind::PhaseIn => "PhaseIn",
            NodeKind::PhaseOut => "PhaseOut",
            NodeKind::Scan { .. } => "Scan",
            NodeKind::Operator(name) => name,
        }
    }
}

/// Typed side-table attached to every plan node.
///
/// `types` and `key_indexes` are indexed by tag, the position of the producing branch
/// within the shuffle the metadata is meant for. A missing entry means that no
/// cross-boundary serialization applies for that tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeProperties {
    pub types: Vec<Option<Vec<DataType>>>,
    pub key_indexes: Vec<Option<KeyIndexes>>,
    /// Sequence number of the job whose output replaces this node's subtree.
    pub input_seq: Option<Seq>,
}

impl NodeProperties {
    /// Records the tuple layout emitted for `tag`.
    pub fn with_tag(
        mut self,
        tag: usize,
        types: Vec<DataType>,
        key_indexes: impl IntoIterator<Item = usize>,
    ) -> Self {
        if self.types.len() <= tag {
            self.types.resize(tag + 1, None);
        }
        if self.key_indexes.len() <= tag {
            self.key_indexes.resize(tag + 1, None);
        }
        self.types[tag] = Some(types);
        self.key_indexes[tag] = Some(key_indexes.into_iter().collect());
        self
    }

    pub fn with_input_seq(mut self, seq: Seq) -> Self {
        self.input_seq = Some(seq);
        self
    }

    pub fn types(&self, tag: usize) -> Option<&[DataType]> {
        self.types.get(tag).and_then(|t| t.as_deref())
    }

    pub fn key_indexes(&self, tag: usize) -> Option<&KeyIndexes> {
        self.key_indexes.get(tag).and_then(|k| k.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanNode {
    pub kind: NodeKind,
    pub props: NodeProperties,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl PlanNode {
    fn new(kind: NodeKind, props: NodeProperties) -> Self {
        Self {
            kind,
            props,
            children: vec![],
            parent: None,
        }
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Whether this node stands in for the output of an already extracted job.
    pub fn is_placeholder(&self) -> bool {
        self.props.input_seq.is_some()
    }
}

/// Execution plan tree as handed over by the query compiler.
///
/// Nodes live in an arena and reference each other by [NodeId]: children are owned
/// through the ordered `children` list, the `parent` link is only a handle.
#[derive(Debug, Clone)]
pub struct PlanTree {
    nodes: Vec<Option<PlanNode>>,
    root: NodeId,
}

impl PlanTree {
    /// Creates a tree made of a single root node.
    pub fn new(kind: NodeKind, props: NodeProperties) -> Self {
        Self {
            nodes: vec![Some(PlanNode::new(kind, props))],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node(&self, id: NodeId) -> Result<&PlanNode> {
        self.nodes
            .get(id.0)
            .and_then(|n| n.as_ref())
            .ok_or_else(|| malformed_plan_err(format!("node {id} does not exist")))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut PlanNode> {
        self.nodes
            .get_mut(id.0)
            .and_then(|n| n.as_mut())
            .ok_or_else(|| malformed_plan_err(format!("node {id} does not exist")))
    }

    pub fn kind(&self, id: NodeId) -> Result<&NodeKind> {
        Ok(&self.node(id)?.kind)
    }

    pub fn props(&self, id: NodeId) -> Result<&NodeProperties> {
        Ok(&self.node(id)?.props)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(self.node(id)?.children())
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    pub fn last_child(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.children(id)?.last().copied())
    }

    /// Appends a new node as the last child of `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        props: NodeProperties,
    ) -> Result<NodeId> {
        self.node(parent)?;
        let mut node = PlanNode::new(kind, props);
        node.parent = Some(parent);
        let id = self.push(node);
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Position of `id` among its parent's children.
    pub fn child_index(&self, id: NodeId) -> Result<usize> {
        let Some(parent) = self.parent(id)? else {
            return Err(malformed_plan_err(format!("node {id} has no parent")));
        };
        self.children(parent)?
            .iter()
            .position(|c| *c == id)
            .ok_or_else(|| {
                malformed_plan_err(format!("node {id} is not a child of its parent {parent}"))
            })
    }

    /// Lightweight, childless copy of `id` that records `seq` as the job producing its data.
    pub fn placeholder(&self, id: NodeId, seq: Seq) -> Result<PlanNode> {
        let node = self.node(id)?;
        Ok(PlanNode::new(
            node.kind.clone(),
            node.props.clone().with_input_seq(seq),
        ))
    }

    /// Puts `replacement` at position `index` of `parent`. The replaced child stays in the
    /// arena without a parent and is returned, ready to be detached.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        index: usize,
        mut replacement: PlanNode,
    ) -> Result<NodeId> {
        let old = self.child_at(parent, index)?;
        replacement.parent = Some(parent);
        replacement.children.clear();
        let new = self.push(replacement);
        self.node_mut(parent)?.children[index] = new;
        self.node_mut(old)?.parent = None;
        Ok(old)
    }

    /// Unlinks the child at `index` from `parent` and returns it.
    pub fn remove_child(&mut self, parent: NodeId, index: usize) -> Result<NodeId> {
        let old = self.child_at(parent, index)?;
        self.node_mut(parent)?.children.remove(index);
        self.node_mut(old)?.parent = None;
        Ok(old)
    }

    /// Moves the subtree rooted at `id` out of this tree into a new, independent tree.
    pub fn detach(&mut self, id: NodeId) -> Result<PlanTree> {
        if let Some(parent) = self.parent(id)? {
            let index = self.child_index(id)?;
            self.node_mut(parent)?.children.remove(index);
        }

        let mut detached = PlanTree {
            nodes: vec![],
            root: NodeId(0),
        };
        let mut stack = vec![(id, None)];
        while let Some((old_id, new_parent)) = stack.pop() {
            let mut node = self
                .nodes
                .get_mut(old_id.0)
                .and_then(Option::take)
                .ok_or_else(|| malformed_plan_err(format!("node {old_id} does not exist")))?;
            let old_children = std::mem::take(&mut node.children);
            node.parent = new_parent;
            let new_id = detached.push(node);
            if let Some(p) = new_parent {
                detached.node_mut(p)?.children.push(new_id);
            }
            // reversed so that children are re-inserted in their original order
            for child in old_children.into_iter().rev() {
                stack.push((child, Some(new_id)));
            }
        }
        Ok(detached)
    }

    /// Compact deep copy of the live part of the tree.
    pub fn copy_tree(&self) -> Result<PlanTree> {
        let mut copy = self.clone();
        copy.detach(self.root)
    }

    /// Pre-order traversal starting at `id`.
    pub fn descendants(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut out = vec![];
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next)?.iter().rev());
        }
        Ok(out)
    }

    /// Walks parent links up to the node that has no parent.
    pub fn absolute_root(&self, id: NodeId) -> Result<NodeId> {
        let mut current = id;
        while let Some(parent) = self.parent(current)? {
            current = parent;
        }
        Ok(current)
    }

    /// First boundary reached from `id` following last children only.
    pub fn find_boundary(&self, id: NodeId) -> Result<Option<NodeId>> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.kind(node)?.is_boundary() {
                return Ok(Some(node));
            }
            current = self.last_child(node)?;
        }
        Ok(None)
    }

    fn child_at(&self, parent: NodeId, index: usize) -> Result<NodeId> {
        self.children(parent)?.get(index).copied().ok_or_else(|| {
            malformed_plan_err(format!("node {parent} has no child at position {index}"))
        })
    }

    fn push(&mut self, node: PlanNode) -> NodeId {
        self.nodes.push(Some(node));
        NodeId(self.nodes.len() - 1)
    }
}
