use std::{collections::BTreeMap, fmt::Display};

use datafusion::common::ScalarValue;

use crate::splits::LogicalInput;

/// Zero-based submission order of an extracted job plan.
pub type Seq = usize;

/// Column positions that make up the grouping/partitioning key of a tuple, in the order
/// the key compares.
pub type KeyIndexes = Vec<usize>;

/// Correlated outer tuple a plan is evaluated against, one value per bound variable.
pub type Tuple = Vec<ScalarValue>;

/// Identifier the execution runtime assigns to a submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub String);

impl Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Compilation context shared by every job of one plan evaluation.
///
/// It is produced by the query compiler; here we only carry what the jobs need at
/// runtime: the declared logical inputs and the prolog options.
#[derive(Debug, Clone, Default)]
pub struct StaticContext {
    /// Logical inputs referenced by `Scan` leaves, by position.
    pub inputs: Vec<LogicalInput>,
    /// Free-form options declared by the query.
    pub options: BTreeMap<String, String>,
}

impl StaticContext {
    pub fn new(inputs: Vec<LogicalInput>) -> Self {
        Self {
            inputs,
            options: BTreeMap::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn input(&self, index: usize) -> Option<&LogicalInput> {
        self.inputs.get(index)
    }
}
