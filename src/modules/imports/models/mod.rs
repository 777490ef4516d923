pub mod import_result;

pub use import_result::{AggregationResult, ImportKind, ImportRequest, ImportResult};
