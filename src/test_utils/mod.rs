pub mod plans;
pub mod runtime;
pub mod splits;
