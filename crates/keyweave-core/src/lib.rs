pub mod config;
pub mod error;
pub mod keys;
pub mod schema;
pub mod sequence;

// Re-export key types for convenience
pub use error::{KeyweaveError, Result};
pub use keys::{build_coproduct, iterate_rows, IterOptions, KeyDomain, RowKey, RowKeys};
pub use schema::{KeySelection, SchemaGraph, TableSpec};
pub use sequence::{count, squared, triangled, Sequencer};
