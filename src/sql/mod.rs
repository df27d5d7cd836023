//! SQL generation module.
//!
//! This module provides a type-safe SQL builder that generates multi-dialect SQL.
//! It includes:
//!
//! - [`query`] - SELECT query builder
//! - [`expr`] - Expression AST and builder DSL
//! - [`dml`] - Data Manipulation Language (INSERT, UPDATE, DELETE)
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations

pub mod dialect;
pub mod dml;
pub mod expr;
pub mod query;
pub mod token;


// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    col, eq_value, lit_int, lit_str, raw_sql, star, table_col, BinaryOperator, Expr,
    ExprExt, Literal,
};
pub use query::{Join, JoinType, Query, SelectExpr, TableRef};
pub use token::{Token, TokenStream};

pub use dml::{Delete, Insert, Update};
