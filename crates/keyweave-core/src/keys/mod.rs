pub mod coproduct;
pub mod domain;
pub mod engine;

pub use coproduct::{build_coproduct, ColumnDomain, Coproduct};
pub use domain::KeyDomain;
pub use engine::{iterate_rows, IterOptions, RowKey, RowKeys, StreamKind, StreamPlan};
