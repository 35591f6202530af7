//! SQLite SQL dialect.
//!
//! SQLite differences from ANSI are minimal:
//! - Double-quote identifier quoting (backticks are tolerated for
//!   compatibility, which is what lets MySQL-rendered statements run
//!   unchanged on a SQLite connection)
//! - Named parameters use `:name` markers

use super::helpers;
use super::SqlDialect;

/// SQLite SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }
}
