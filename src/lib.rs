#![deny(clippy::all)]

mod config;
mod decompose;
mod evaluate;
mod job;
mod logging;
mod metadata;
mod plan;
mod result;
mod splits;
mod vocab;

#[cfg(any(feature = "integration", test))]
pub mod test_utils;

pub use config::MrConfig;
pub use decompose::{decompose, BoundaryTree, Decomposition, JobPlan};
pub use evaluate::{Evaluation, PlanEvaluator};
pub use job::{
    output_location, ExecutionRuntime, JobConf, JobDriver, JobInput, JobRegistry, JobStatus,
    Progress,
};
pub use metadata::{resolve, resolve_forwarded, ShuffleMetadata, TagMetadata, TaskRole};
pub use plan::{
    display_jobs_graphviz, NodeDescription, NodeId, NodeKind, NodeProperties, PlanDescription,
    PlanNode, PlanTree,
};
pub use result::{MrError, Result};
pub use splits::{
    FileFormat, FormatRegistry, InputFormat, InputSplit, LogicalInput, SplitAssigner,
    SplitContext, SplitRecord,
};
pub use vocab::{JobId, KeyIndexes, Seq, StaticContext, Tuple};
