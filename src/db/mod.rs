//! Synchronous database adapter.
//!
//! Wraps an embedded SQLite connection behind the descriptor/dialect split:
//! the [`Descriptor`] says where to connect, its [`Dialect`] says how
//! identifiers and strings are quoted in the SQL sent there. MySQL-quoted
//! statements run unchanged against the embedded driver because SQLite
//! accepts backtick identifiers.
//!
//! Adapters are single-threaded: introspection state lives in `RefCell`s and
//! callers share adapters through `Rc`, so the type is not `Send`.

pub mod events;
pub mod row;
pub mod value;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rusqlite::types::ValueRef;
use rusqlite::Connection;

use crate::config::Descriptor;
use crate::sql::dialect::{Dialect, SqlDialect};

pub use events::EventNotifier;
pub use row::Row;
pub use value::{Bind, BindMap, BindType, Value};

/// Error type for adapter operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Connection failed for {descriptor}: {source}")]
    ConnectionFailure {
        descriptor: String,
        source: rusqlite::Error,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Refusing to {operation} {table} without a condition")]
    DangerousOperation {
        operation: &'static str,
        table: String,
    },

    #[error("Insert into {table} supplies {values} values for {fields} fields")]
    FieldCountMismatch {
        table: String,
        fields: usize,
        values: usize,
    },

    #[error("Already inside a transaction")]
    AlreadyInTransaction,

    #[error("No active transaction")]
    NoActiveTransaction,
}

pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Bind arguments
// =============================================================================

/// Statement parameters: none, positional (`?`), or named (`:name`).
#[derive(Debug, Clone, Default)]
pub enum BindArgs {
    #[default]
    None,
    Positional(Vec<Value>),
    Named(BindMap),
}

impl From<()> for BindArgs {
    fn from(_: ()) -> Self {
        BindArgs::None
    }
}

impl From<Vec<Value>> for BindArgs {
    fn from(values: Vec<Value>) -> Self {
        BindArgs::Positional(values)
    }
}

impl From<BindMap> for BindArgs {
    fn from(map: BindMap) -> Self {
        BindArgs::Named(map)
    }
}

impl<K: Into<String>, V: Into<Bind>, const N: usize> From<[(K, V); N]> for BindArgs {
    fn from(entries: [(K, V); N]) -> Self {
        BindArgs::Named(BindMap::from(entries))
    }
}

/// An identifier to escape: bare, or qualified by schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Bare(String),
    Qualified(String, String),
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Identifier::Bare(name.to_string())
    }
}

impl From<(&str, &str)> for Identifier {
    fn from((schema, name): (&str, &str)) -> Self {
        Identifier::Qualified(schema.to_string(), name.to_string())
    }
}

// =============================================================================
// Adapter
// =============================================================================

/// Synchronous connection handle.
///
/// Connects eagerly on construction. The last statement sent and its bind
/// parameters stay readable through [`Adapter::sql_statement`] and
/// [`Adapter::sql_bind_params`] until the next call replaces them.
pub struct Adapter {
    conn: Connection,
    descriptor: Descriptor,
    last_sql: RefCell<String>,
    last_binds: RefCell<BindMap>,
    transaction_level: Cell<u32>,
    notifier: Option<Rc<dyn EventNotifier>>,
}

impl Adapter {
    /// Open a connection described by `descriptor`.
    pub fn connect(descriptor: Descriptor) -> DbResult<Self> {
        let conn = Connection::open(descriptor.database_path()).map_err(|source| {
            DbError::ConnectionFailure {
                descriptor: descriptor.connection_string(),
                source,
            }
        })?;
        tracing::debug!("connected to {}", descriptor.connection_string());

        Ok(Adapter {
            conn,
            descriptor,
            last_sql: RefCell::new(String::new()),
            last_binds: RefCell::new(BindMap::new()),
            transaction_level: Cell::new(0),
            notifier: None,
        })
    }

    /// Open a throwaway in-memory connection.
    pub fn connect_in_memory() -> DbResult<Self> {
        Self::connect(Descriptor::in_memory())
    }

    /// Attach an observer for statement and transaction activity.
    pub fn with_notifier(mut self, notifier: Rc<dyn EventNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn dialect(&self) -> Dialect {
        self.descriptor.dialect
    }

    // =========================================================================
    // Statement execution
    // =========================================================================

    /// Run a statement that returns no rows; the count of affected rows.
    /// Statements without binds skip the binding pass entirely.
    pub fn execute(&self, sql: &str, binds: impl Into<BindArgs>) -> DbResult<usize> {
        let binds = binds.into();
        self.record(sql, &binds);

        let affected = if matches!(binds, BindArgs::None) {
            self.conn.execute(sql, [])?
        } else {
            let mut stmt = self.conn.prepare(sql)?;
            bind_statement(&mut stmt, &binds)?;
            stmt.raw_execute()?
        };

        self.notify_after(sql);
        Ok(affected)
    }

    /// Run a SELECT and fetch every row.
    pub fn query(&self, sql: &str, binds: impl Into<BindArgs>) -> DbResult<Vec<Row>> {
        self.run_select(sql, &binds.into(), None)
    }

    /// Alias for [`Adapter::query`].
    pub fn fetch_all(&self, sql: &str, binds: impl Into<BindArgs>) -> DbResult<Vec<Row>> {
        self.run_select(sql, &binds.into(), None)
    }

    /// Fetch the first row, when any. Stops reading after one row.
    pub fn fetch_one(&self, sql: &str, binds: impl Into<BindArgs>) -> DbResult<Option<Row>> {
        let mut rows = self.run_select(sql, &binds.into(), Some(1))?;
        Ok(rows.pop())
    }

    /// Fetch the first column of the first row, when any.
    pub fn fetch_column(&self, sql: &str, binds: impl Into<BindArgs>) -> DbResult<Option<Value>> {
        let row = self.fetch_one(sql, binds)?;
        Ok(row.and_then(|r| r.get_index(0).cloned()))
    }

    fn run_select(
        &self,
        sql: &str,
        binds: &BindArgs,
        limit: Option<usize>,
    ) -> DbResult<Vec<Row>> {
        self.record(sql, binds);

        let mut stmt = self.conn.prepare(sql)?;
        bind_statement(&mut stmt, binds)?;

        // One shared header for the whole result set.
        let columns: Rc<Vec<String>> =
            Rc::new(stmt.column_names().iter().map(|c| c.to_string()).collect());

        let mut out = Vec::new();
        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(read_value(row.get_ref(i)?));
            }
            out.push(Row::new(Rc::clone(&columns), values));
            if limit.is_some_and(|n| out.len() >= n) {
                break;
            }
        }
        drop(rows);

        self.notify_after(sql);
        Ok(out)
    }

    fn record(&self, sql: &str, binds: &BindArgs) {
        let recorded = recorded_binds(binds);
        tracing::debug!("executing: {}", sql);
        if let Some(notifier) = &self.notifier {
            notifier.before_query(sql, &recorded);
        }
        *self.last_sql.borrow_mut() = sql.to_string();
        *self.last_binds.borrow_mut() = recorded;
    }

    fn notify_after(&self, sql: &str) {
        if let Some(notifier) = &self.notifier {
            notifier.after_query(sql);
        }
    }

    // =========================================================================
    // DML helpers
    // =========================================================================

    /// Insert one row. Without `fields` the values bind positionally in
    /// array order against the table's full column list; with `fields` each
    /// value binds under its column name and the two lists must be the same
    /// length. True when exactly one row was affected.
    pub fn insert(
        &self,
        table: &str,
        values: Vec<Value>,
        fields: Option<Vec<&str>>,
    ) -> DbResult<bool> {
        let dialect = self.descriptor.dialect;
        let affected = match fields {
            Some(fields) => {
                if fields.len() != values.len() {
                    return Err(DbError::FieldCountMismatch {
                        table: table.to_string(),
                        fields: fields.len(),
                        values: values.len(),
                    });
                }
                let columns: Vec<String> = fields
                    .iter()
                    .map(|c| dialect.quote_identifier(c))
                    .collect();
                let markers: Vec<String> =
                    fields.iter().map(|c| dialect.bind_marker(c)).collect();
                let sql = format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    dialect.quote_identifier(table),
                    columns.join(", "),
                    markers.join(", ")
                );
                let mut binds = BindMap::new();
                for (column, value) in fields.into_iter().zip(values) {
                    binds.insert(column, value);
                }
                self.execute(&sql, binds)?
            }
            None => {
                let markers = vec![dialect.positional_marker(); values.len()];
                let sql = format!(
                    "INSERT INTO {} VALUES ({})",
                    dialect.quote_identifier(table),
                    markers.join(", ")
                );
                self.execute(&sql, values)?
            }
        };
        Ok(affected == 1)
    }

    /// Update rows matching `condition`; assignments bind under their column
    /// names, so condition binds must use other names.
    ///
    /// A missing or blank condition is refused: an unbounded UPDATE is almost
    /// always a bug at this layer.
    pub fn update(
        &self,
        table: &str,
        fields: Vec<(&str, Value)>,
        condition: Option<&str>,
        binds: impl Into<BindMap>,
    ) -> DbResult<usize> {
        let condition = require_condition(condition, "UPDATE", table)?;
        let dialect = self.descriptor.dialect;

        let assignments: Vec<String> = fields
            .iter()
            .map(|(c, _)| format!("{} = {}", dialect.quote_identifier(c), dialect.bind_marker(c)))
            .collect();
        let mut all = BindMap::new();
        for (column, value) in fields {
            all.insert(column, value);
        }
        all.merge(&binds.into());

        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            dialect.quote_identifier(table),
            assignments.join(", "),
            condition
        );
        self.execute(&sql, all)
    }

    /// Delete rows matching `condition`; refused when the condition is
    /// missing or blank.
    pub fn delete(
        &self,
        table: &str,
        condition: Option<&str>,
        binds: impl Into<BindArgs>,
    ) -> DbResult<usize> {
        let condition = require_condition(condition, "DELETE", table)?;
        let sql = format!(
            "DELETE FROM {} WHERE {}",
            self.descriptor.dialect.quote_identifier(table),
            condition
        );
        self.execute(&sql, binds)
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Start a transaction. Nested transactions are refused.
    pub fn begin(&self) -> DbResult<()> {
        if self.transaction_level.get() > 0 {
            return Err(DbError::AlreadyInTransaction);
        }
        self.conn.execute_batch("BEGIN")?;
        self.transaction_level.set(1);
        if let Some(notifier) = &self.notifier {
            notifier.begin_transaction();
        }
        tracing::debug!("transaction started");
        Ok(())
    }

    /// Commit the active transaction.
    pub fn commit(&self) -> DbResult<()> {
        if self.transaction_level.get() == 0 {
            return Err(DbError::NoActiveTransaction);
        }
        self.conn.execute_batch("COMMIT")?;
        self.transaction_level.set(0);
        if let Some(notifier) = &self.notifier {
            notifier.commit_transaction();
        }
        tracing::debug!("transaction committed");
        Ok(())
    }

    /// Roll back the active transaction.
    pub fn rollback(&self) -> DbResult<()> {
        if self.transaction_level.get() == 0 {
            return Err(DbError::NoActiveTransaction);
        }
        self.conn.execute_batch("ROLLBACK")?;
        self.transaction_level.set(0);
        if let Some(notifier) = &self.notifier {
            notifier.rollback_transaction();
        }
        tracing::debug!("transaction rolled back");
        Ok(())
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction_level.get() > 0
    }

    pub fn transaction_level(&self) -> u32 {
        self.transaction_level.get()
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Rowid of the most recent successful insert on this connection.
    pub fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    /// Rows changed by the most recent statement.
    pub fn affected_rows(&self) -> u64 {
        self.conn.changes()
    }

    /// The last statement sent through this adapter.
    pub fn sql_statement(&self) -> String {
        self.last_sql.borrow().clone()
    }

    /// Bind parameters of the last statement; positional binds appear under
    /// their one-based index.
    pub fn sql_bind_params(&self) -> BindMap {
        self.last_binds.borrow().clone()
    }

    /// Whether `table` exists. The embedded driver has a single namespace, so
    /// `schema` is accepted for API parity and ignored.
    pub fn table_exists(&self, table: &str, _schema: Option<&str>) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            rusqlite::params![table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Quote an identifier in this connection's dialect.
    pub fn escape_identifier(&self, identifier: impl Into<Identifier>) -> String {
        let dialect = self.descriptor.dialect;
        match identifier.into() {
            Identifier::Bare(name) => dialect.quote_identifier(&name),
            Identifier::Qualified(schema, name) => dialect.quote_qualified(&schema, &name),
        }
    }

    /// Quote a string literal in this connection's dialect.
    pub fn escape_string(&self, s: &str) -> String {
        self.descriptor.dialect.quote_string(s)
    }
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("descriptor", &self.descriptor.connection_string())
            .field("transaction_level", &self.transaction_level.get())
            .finish()
    }
}

fn require_condition<'a>(
    condition: Option<&'a str>,
    operation: &'static str,
    table: &str,
) -> DbResult<&'a str> {
    match condition {
        Some(c) if !c.trim().is_empty() => Ok(c),
        _ => Err(DbError::DangerousOperation {
            operation,
            table: table.to_string(),
        }),
    }
}

// =============================================================================
// Driver plumbing
// =============================================================================

fn bind_statement(stmt: &mut rusqlite::Statement<'_>, binds: &BindArgs) -> DbResult<()> {
    match binds {
        BindArgs::None => {}
        BindArgs::Positional(values) => {
            for (i, value) in values.iter().enumerate() {
                stmt.raw_bind_parameter(i + 1, driver_value(&Bind::new(value.clone())))?;
            }
        }
        BindArgs::Named(map) => {
            // Names that the statement never mentions are skipped, so callers
            // may over-supply binds.
            for (name, bind) in map.iter() {
                let marker = format!(":{}", name);
                if let Some(index) = stmt.parameter_index(&marker)? {
                    stmt.raw_bind_parameter(index, driver_value(bind))?;
                }
            }
        }
    }
    Ok(())
}

/// Coerce a bind to the driver value its effective type tag calls for.
fn driver_value(bind: &Bind) -> rusqlite::types::Value {
    use rusqlite::types::Value as Sql;

    match bind.bind_type() {
        BindType::Null => Sql::Null,
        BindType::Int => match &bind.value {
            Value::Int(i) => Sql::Integer(*i),
            Value::Bool(b) => Sql::Integer(*b as i64),
            Value::Float(f) => Sql::Integer(*f as i64),
            Value::Str(s) => match s.parse::<i64>() {
                Ok(i) => Sql::Integer(i),
                Err(_) => Sql::Text(s.clone()),
            },
            Value::Null => Sql::Null,
            Value::Bytes(b) => Sql::Blob(b.clone()),
        },
        BindType::Bool => match &bind.value {
            Value::Bool(b) => Sql::Integer(*b as i64),
            Value::Int(i) => Sql::Integer((*i != 0) as i64),
            Value::Float(f) => Sql::Integer((*f != 0.0) as i64),
            Value::Str(s) => Sql::Integer(!s.is_empty() as i64),
            Value::Null => Sql::Null,
            Value::Bytes(b) => Sql::Integer(!b.is_empty() as i64),
        },
        BindType::Str => match &bind.value {
            Value::Str(s) => Sql::Text(s.clone()),
            Value::Int(i) => Sql::Text(i.to_string()),
            // Floats travel as decimal strings; SQLite's numeric affinity
            // recovers the number where the column calls for one.
            Value::Float(f) => Sql::Text(f.to_string()),
            Value::Bool(b) => Sql::Text(if *b { "1" } else { "0" }.to_string()),
            Value::Bytes(b) => Sql::Blob(b.clone()),
            Value::Null => Sql::Null,
        },
    }
}

fn read_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(t) => Value::Str(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    }
}

fn recorded_binds(binds: &BindArgs) -> BindMap {
    match binds {
        BindArgs::None => BindMap::new(),
        BindArgs::Named(map) => map.clone(),
        BindArgs::Positional(values) => {
            let mut map = BindMap::new();
            for (i, value) in values.iter().enumerate() {
                map.insert((i + 1).to_string(), value.clone());
            }
            map
        }
    }
}
