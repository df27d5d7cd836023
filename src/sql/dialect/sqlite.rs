//! SQLite SQL dialect.
//!
//! Used by the embedded [`crate::executor::SqliteExecutor`].
//! - ANSI identifier quoting (`"`)
//! - No boolean storage class, booleans are 1/0 integers

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

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }
}
