//! Bound statement execution.
//!
//! A [`Query`] pairs a rendered intermediate statement with the binds the
//! builder collected. At execution time the registry resolves each source
//! model to its backing table and the connection reads should go through;
//! the statement's segments then collapse into driver SQL quoted for that
//! connection's dialect, and bind markers switch to the driver's `:name`
//! syntax.

use std::rc::Rc;

use super::statement::{Segment, Statement};
use crate::db::value::BindMap;
use crate::db::{Adapter, DbError, Row};
use crate::registry::ModelRegistry;
use crate::sql::dialect::SqlDialect;

/// Error type for statement execution.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("No registered model provides a connection: {0}")]
    NoSourceModel(String),

    #[error("Execution failed for `{sql}`: {source}")]
    Execution { sql: String, source: DbError },
}

pub type QueryResult<T> = Result<T, QueryError>;

/// Rows produced by a query.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultSet {
    /// Every matching row.
    Rows(Vec<Row>),
    /// The single row of a unique-row query, when one matched.
    Row(Option<Row>),
}

impl ResultSet {
    pub fn first(&self) -> Option<&Row> {
        match self {
            ResultSet::Rows(rows) => rows.first(),
            ResultSet::Row(row) => row.as_ref(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ResultSet::Rows(rows) => rows.len(),
            ResultSet::Row(row) => row.iter().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into a vector; a unique-row result yields zero or one rows.
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            ResultSet::Rows(rows) => rows,
            ResultSet::Row(row) => row.into_iter().collect(),
        }
    }
}

/// An executable statement bound to a registry.
pub struct Query {
    statement: Statement,
    binds: BindMap,
    registry: Rc<dyn ModelRegistry>,
    unique_row: bool,
}

impl Query {
    pub fn new(statement: Statement, binds: BindMap, registry: Rc<dyn ModelRegistry>) -> Self {
        Query {
            statement,
            binds,
            registry,
            unique_row: false,
        }
    }

    /// Fetch a single row instead of the full result set.
    #[must_use]
    pub fn unique_row(mut self, unique: bool) -> Self {
        self.unique_row = unique;
        self
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn bind_params(&self) -> &BindMap {
        &self.binds
    }

    /// The driver SQL this query will send, quoted for the resolved
    /// connection's dialect.
    pub fn sql(&self) -> QueryResult<String> {
        self.resolve().map(|(_, sql)| sql)
    }

    /// Execute against the resolved connection.
    ///
    /// `extra` binds merge over the builder's; same-named call binds win.
    /// Markers left without a matching bind reach the driver unbound and
    /// read as NULL.
    pub fn execute(&self, extra: impl Into<BindMap>) -> QueryResult<ResultSet> {
        let (connection, sql) = self.resolve()?;

        let mut binds = self.binds.clone();
        binds.merge(&extra.into());

        if self.unique_row {
            let row = connection
                .fetch_one(&sql, binds)
                .map_err(|source| QueryError::Execution {
                    sql: sql.clone(),
                    source,
                })?;
            Ok(ResultSet::Row(row))
        } else {
            let rows = connection
                .query(&sql, binds)
                .map_err(|source| QueryError::Execution {
                    sql: sql.clone(),
                    source,
                })?;
            Ok(ResultSet::Rows(rows))
        }
    }

    /// Pick the read connection and render driver SQL for its dialect.
    fn resolve(&self) -> QueryResult<(Rc<Adapter>, String)> {
        let sources = self.statement.sources();
        let connection = sources
            .iter()
            .find_map(|model| self.registry.read_connection(model))
            .ok_or_else(|| QueryError::NoSourceModel(sources.join(", ")))?;

        let dialect = connection.dialect();
        let mut sql = String::new();
        for segment in self.statement.segments() {
            match segment {
                Segment::Sql(text) => sql.push_str(text),
                Segment::Source(model) => {
                    let source = self
                        .registry
                        .source(model)
                        .unwrap_or_else(|| model.clone());
                    match self.registry.schema(model) {
                        Some(schema) => sql.push_str(&dialect.quote_qualified(&schema, &source)),
                        None => sql.push_str(&dialect.quote_identifier(&source)),
                    }
                }
                Segment::Ident(ident) => sql.push_str(&dialect.quote_identifier(ident)),
                Segment::Bind(name) => sql.push_str(&dialect.bind_marker(name)),
            }
        }

        Ok((connection, sql))
    }
}

impl std::fmt::Debug for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("statement", &self.statement.text())
            .field("binds", &self.binds)
            .field("unique_row", &self.unique_row)
            .finish()
    }
}
