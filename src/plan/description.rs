use std::{collections::BTreeMap, str::FromStr};

use datafusion::arrow::datatypes::DataType;
use serde::Deserialize;

use crate::{
    plan::{NodeId, NodeKind, NodeProperties, PlanTree},
    result::{malformed_plan_err, Result},
    splits::LogicalInput,
    vocab::StaticContext,
};

/// Serialized form of a compiled plan, as accepted by `mr-explain`.
///
/// ```json
/// {
///   "inputs": ["lineitem:file:/data/lineitem"],
///   "options": { "timezone": "UTC" },
///   "plan": {
///     "kind": "end",
///     "children": [{
///       "kind": "shuffle",
///       "types": [["Utf8", "Float64"]],
///       "keys": [[0]],
///       "children": [{ "kind": "scan", "input": 0 }]
///     }]
///   }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PlanDescription {
    /// Logical input declarations in `name:format:path[;path...]` form.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Query options handed to every job unchanged.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    pub plan: NodeDescription,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeDescription {
    /// One of `shuffle`, `end`, `phase_in`, `phase_out`, `scan`, or any operator name.
    pub kind: String,
    /// Logical input position, only for `scan`.
    #[serde(default)]
    pub input: Option<usize>,
    /// Arrow type names per tag, `null` for tags without metadata.
    #[serde(default)]
    pub types: Vec<Option<Vec<String>>>,
    /// Key column positions per tag.
    #[serde(default)]
    pub keys: Vec<Option<Vec<usize>>>,
    #[serde(default)]
    pub children: Vec<NodeDescription>,
}

impl PlanDescription {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Static context holding the parsed logical input declarations and the options.
    pub fn static_context(&self) -> Result<StaticContext> {
        let inputs = self
            .inputs
            .iter()
            .map(|decl| LogicalInput::parse(decl))
            .collect::<Result<Vec<_>>>()?;
        Ok(self
            .options
            .iter()
            .fold(StaticContext::new(inputs), |ctx, (key, value)| {
                ctx.with_option(key, value)
            }))
    }

    pub fn plan_tree(&self) -> Result<PlanTree> {
        let root = &self.plan;
        let mut tree = PlanTree::new(root.node_kind()?, root.properties()?);
        let mut stack: Vec<(NodeId, &NodeDescription)> = vec![(tree.root(), root)];
        while let Some((id, description)) = stack.pop() {
            for child in &description.children {
                let child_id = tree.add_child(id, child.node_kind()?, child.properties()?)?;
                stack.push((child_id, child));
            }
        }
        Ok(tree)
    }
}

impl NodeDescription {
    fn node_kind(&self) -> Result<NodeKind> {
        Ok(match self.kind.as_str() {
            "shuffle" => NodeKind::Shuffle,
            "end" => NodeKind::End,
            "phase_in" => NodeKind::PhaseIn,
            "phase_out" => NodeKind::PhaseOut,
            "scan" => NodeKind::Scan {
                input: self
                    .input
                    .ok_or_else(|| malformed_plan_err("scan node without an input position"))?,
            },
            other => NodeKind::Operator(other.to_owned()),
        })
    }

    fn properties(&self) -> Result<NodeProperties> {
        let types = self
            .types
            .iter()
            .map(|tag| {
                tag.as_ref()
                    .map(|names| {
                        names
                            .iter()
                            .map(|name| DataType::from_str(name))
                            .collect::<Result<Vec<_>, _>>()
                    })
                    .transpose()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(NodeProperties {
            types,
            key_indexes: self.keys.clone(),
            input_seq: None,
        })
    }
}
