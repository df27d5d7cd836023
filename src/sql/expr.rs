//! Expression AST - the core of SQL expression building.
//!
//! This module provides a strongly-typed AST for the expressions the
//! statement builder emits: qualified columns, literals, equality predicates
//! joined with AND, and the raw ORDER BY escape hatch.

use super::dialect::Dialect;
use super::token::{Token, TokenStream};
use crate::value::ScalarValue;

// =============================================================================
// Expression AST
// =============================================================================

/// A SQL expression.
///
/// Every variant must be handled in `to_tokens_for_dialect()` - the compiler enforces this.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference: optional_table.column
    Column {
        table: Option<String>,
        column: String,
    },

    /// Literal values
    Literal(Literal),

    /// Binary operation: left op right
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    /// IS NULL
    IsNull(Box<Expr>),

    /// Wildcard: * or table.*
    Star { table: Option<String> },

    /// Raw SQL expression passed directly to output without escaping.
    ///
    /// # Security Warning
    ///
    /// **Never pass unchecked user input to this variant.** Raw SQL is not
    /// sanitized; the `orderBy` argument reaches it only after
    /// [`crate::modifiers::OrderBy::parse`] accepted it.
    Raw(String),
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Null,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    And,
}

impl Expr {
    /// Convert this expression to a token stream (dialect-agnostic).
    pub fn to_tokens(&self) -> TokenStream {
        self.to_tokens_for_dialect(Dialect::default())
    }

    /// Convert this expression to a token stream for a specific dialect.
    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        match self {
            Expr::Column { table, column } => {
                if let Some(t) = table {
                    ts.push(Token::Ident(t.clone()));
                    ts.push(Token::Dot);
                }
                ts.push(Token::Ident(column.clone()));
            }

            Expr::Literal(lit) => {
                ts.push(match lit {
                    Literal::Int(n) => Token::LitInt(*n),
                    Literal::Float(f) => Token::LitFloat(*f),
                    Literal::String(s) => Token::LitString(s.clone()),
                    Literal::Bool(b) => Token::LitBool(*b),
                    Literal::Null => Token::LitNull,
                });
            }

            Expr::BinaryOp { left, op, right } => {
                ts.append(&left.to_tokens_for_dialect(dialect));
                ts.space();
                ts.push(match op {
                    BinaryOperator::Eq => Token::Eq,
                    BinaryOperator::And => Token::And,
                });
                ts.space();
                ts.append(&right.to_tokens_for_dialect(dialect));
            }

            Expr::IsNull(expr) => {
                ts.append(&expr.to_tokens_for_dialect(dialect));
                ts.space().push(Token::IsNull);
            }

            Expr::Star { table } => {
                if let Some(t) = table {
                    ts.push(Token::Ident(t.clone()));
                    ts.push(Token::Dot);
                }
                ts.push(Token::Star);
            }

            Expr::Raw(sql) => {
                ts.push(Token::Raw(sql.clone()));
            }
        }

        ts
    }
}

// =============================================================================
// Expression Constructors
// =============================================================================

/// Create a column reference.
pub fn col(name: &str) -> Expr {
    Expr::Column {
        table: None,
        column: name.into(),
    }
}

/// Create a qualified column reference (table.column).
pub fn table_col(table: &str, column: &str) -> Expr {
    Expr::Column {
        table: Some(table.into()),
        column: column.into(),
    }
}

/// Create an integer literal.
pub fn lit_int(n: i64) -> Expr {
    Expr::Literal(Literal::Int(n))
}

/// Create a string literal.
pub fn lit_str(s: &str) -> Expr {
    Expr::Literal(Literal::String(s.into()))
}

/// Create a star (*) expression.
pub fn star() -> Expr {
    Expr::Star { table: None }
}

/// Create a raw SQL expression.
///
/// # Security Warning
///
/// **Never pass unchecked user input to this function.**
pub fn raw_sql(sql: &str) -> Expr {
    Expr::Raw(sql.into())
}

/// Equality predicate that treats a NULL value as `IS NULL`.
///
/// `column = NULL` never matches, so a `where: { deletedAt: null }` filter
/// has to be rendered differently from a plain equality.
pub fn eq_value(column: Expr, value: &ScalarValue) -> Expr {
    match value {
        ScalarValue::Null => column.is_null(),
        other => column.eq(Expr::from(other)),
    }
}

// =============================================================================
// Expression Builder Trait
// =============================================================================

/// Extension trait for building expressions fluently.
pub trait ExprExt: Sized {
    fn into_expr(self) -> Expr;

    fn eq(self, other: impl Into<Expr>) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self.into_expr()),
            op: BinaryOperator::Eq,
            right: Box::new(other.into()),
        }
    }

    fn and(self, other: impl Into<Expr>) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self.into_expr()),
            op: BinaryOperator::And,
            right: Box::new(other.into()),
        }
    }

    #[allow(clippy::wrong_self_convention)]
    fn is_null(self) -> Expr {
        Expr::IsNull(Box::new(self.into_expr()))
    }

    /// Alias this expression (for SELECT list).
    fn alias(self, name: &str) -> crate::sql::query::SelectExpr {
        crate::sql::query::SelectExpr {
            expr: self.into_expr(),
            alias: Some(name.into()),
        }
    }
}

impl ExprExt for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        lit_int(n)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        lit_str(s)
    }
}

impl From<&ScalarValue> for Expr {
    fn from(value: &ScalarValue) -> Self {
        Expr::Literal(match value {
            ScalarValue::Null => Literal::Null,
            ScalarValue::Bool(b) => Literal::Bool(*b),
            ScalarValue::Int(n) => Literal::Int(*n),
            ScalarValue::Float(f) => Literal::Float(*f),
            ScalarValue::String(s) => Literal::String(s.clone()),
        })
    }
}

impl From<ScalarValue> for Expr {
    fn from(value: ScalarValue) -> Self {
        Expr::from(&value)
    }
}
