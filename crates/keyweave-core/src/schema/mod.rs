pub mod dependency;
pub mod graph;
pub mod types;

pub use dependency::DependencyGraph;
pub use graph::{SchemaGraph, Table};
pub use types::{ForeignKeyRef, KeySelection, TableSpec};
