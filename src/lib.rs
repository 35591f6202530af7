//! # Katydid
//!
//! Fluent query building, model-aware execution and URI routing for
//! synchronous database applications.
//!
//! ## Architecture
//!
//! The query pipeline separates what a query says from where it runs:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │               Builder (fluent SELECT)                    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [render]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Statement ([source] markers, :name: bind markers)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [model registry]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Query (driver SQL for the resolved connection)         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [execute]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Adapter (bound parameters, rows, transactions)         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! A [`Statement`] names models, not tables; the [`registry`] maps each
//! model to its source table and connection when the query executes, so the
//! same statement can target different schemas or dialects.
//!
//! The [`router`] is independent of the pipeline: it resolves request URIs
//! to handler coordinates (namespace, module, controller, action) plus
//! free-form parameters.

pub mod config;
pub mod db;
pub mod registry;
pub mod router;
pub mod sql;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::{Descriptor, Settings};
    pub use crate::db::{
        Adapter, Bind, BindArgs, BindMap, BindType, EventNotifier, Identifier, Row, Value,
    };
    pub use crate::registry::{ModelRegistry, SimpleRegistry};
    pub use crate::router::{Method, PathValue, Paths, Route, RouteGroup, Router};
    pub use crate::sql::{
        Builder, Columns, Conditions, Dialect, FieldList, FieldSpec, JoinKind, Order, Query,
        ResultSet, Segment, SqlDialect, Statement,
    };
}

// Also export at crate root for convenience
pub use config::Descriptor;
pub use db::{Adapter, Bind, BindMap, Row, Value};
pub use registry::{ModelRegistry, SimpleRegistry};
pub use router::Router;
pub use sql::{Builder, Query, Statement};
