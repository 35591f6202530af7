//! SQL dialect definitions and quoting rules.
//!
//! The intermediate statement keeps identifiers and bind markers abstract
//! (`[name]`, `:name:`); a dialect decides how both are spelled in the SQL
//! that finally reaches the driver:
//!
//! - Identifier quoting: `` ` `` (MySQL), `"` (SQLite)
//! - String literal quoting: `'...'` with `''` escaping
//! - Bind markers: `:name` named parameters, `?` positional
//!
//! # Usage
//!
//! ```ignore
//! use katydid::sql::dialect::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::MySql;
//! let quoted = dialect.quote_identifier("robots");  // `robots`
//! ```

pub mod helpers;
mod mysql;
mod sqlite;

pub use mysql::MySql;
pub use sqlite::Sqlite;

/// SQL dialect trait - defines how identifiers and markers are rendered.
///
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    /// Quote an identifier (table, column, alias).
    ///
    /// - MySQL: `` `identifier` ``
    /// - SQLite: `"identifier"`
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a schema-qualified name.
    fn quote_qualified(&self, schema: &str, name: &str) -> String {
        format!(
            "{}.{}",
            self.quote_identifier(schema),
            self.quote_identifier(name)
        )
    }

    /// Quote a string literal.
    ///
    /// All dialects use single quotes with `''` for escaping.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Named bind-parameter marker in the driver's native syntax.
    fn bind_marker(&self, name: &str) -> String {
        format!(":{}", name)
    }

    /// Positional bind-parameter marker.
    fn positional_marker(&self) -> &'static str {
        "?"
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    MySql,
    Sqlite,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::MySql => &MySql,
            Dialect::Sqlite => &Sqlite,
        }
    }

    /// Parse a dialect name as it appears in connection descriptors.
    pub fn parse(s: &str) -> Option<Dialect> {
        match s.to_lowercase().as_str() {
            "mysql" => Some(Dialect::MySql),
            "sqlite" => Some(Dialect::Sqlite),
            _ => None,
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_qualified(&self, schema: &str, name: &str) -> String {
        self.dialect().quote_qualified(schema, name)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn bind_marker(&self, name: &str) -> String {
        self.dialect().bind_marker(name)
    }

    fn positional_marker(&self) -> &'static str {
        self.dialect().positional_marker()
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}
