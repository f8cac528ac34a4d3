mod description;
mod display;
mod tree;

pub use description::{NodeDescription, PlanDescription};
pub use display::display_jobs_graphviz;
pub use tree::{NodeId, NodeKind, NodeProperties, PlanNode, PlanTree};
