//! Query construction and execution.
//!
//! This module turns fluent builder calls into executable statements:
//!
//! - [`builder`] - fluent SELECT builder
//! - [`conditions`] - field-map condition parsing
//! - [`statement`] - the typed intermediate statement
//! - [`query`] - bound execution against a registry
//! - [`dialect`] - SQL dialect implementations

pub mod builder;
pub mod conditions;
pub mod dialect;
pub mod query;
pub mod statement;

// Re-export commonly used types at the sql module level
pub use builder::{BuildError, BuildResult, Builder, Columns, FieldList, JoinKind, Order};
pub use conditions::{parse, ConditionError, ConditionResult, Conditions, FieldSpec};
pub use dialect::{Dialect, SqlDialect};
pub use query::{Query, QueryError, QueryResult, ResultSet};
pub use statement::{Segment, Statement};
