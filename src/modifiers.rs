//! Query modifiers: `where`, `limit` and `orderBy`.
//!
//! Modifiers arrive from two places. The caller passes them as field
//! arguments; the resolver forces its own (a parent-id filter for a nested
//! relation, or a row restriction on an entity query). [`merge`] combines
//! the two according to a [`Precedence`].

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::{ResolveError, ResolveResult};
use crate::sql::expr::{raw_sql, Expr};
use crate::value::{InputValue, ScalarValue};

pub const WHERE_ARG: &str = "where";
pub const LIMIT_ARG: &str = "limit";
pub const ORDER_BY_ARG: &str = "orderBy";

/// Sentinel meaning "no limit".
pub const UNBOUNDED_LIMIT: i64 = -1;

/// `col [asc|desc]` items separated by commas, columns optionally qualified.
static ORDER_BY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*[a-z_][a-z0-9_]*(\.[a-z_][a-z0-9_]*)?(\s+(asc|desc))?(\s*,\s*[a-z_][a-z0-9_]*(\.[a-z_][a-z0-9_]*)?(\s+(asc|desc))?)*\s*$",
    )
    .unwrap()
});

/// Row limit of a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Limit {
    #[default]
    Unbounded,
    Rows(u64),
}

impl Limit {
    /// Interpret the integer convention: `-1` is unbounded, `0` is a real limit.
    pub fn from_i64(n: i64) -> Option<Self> {
        match n {
            UNBOUNDED_LIMIT => Some(Limit::Unbounded),
            n => u64::try_from(n).ok().map(Limit::Rows),
        }
    }

    pub fn rows(&self) -> Option<u64> {
        match self {
            Limit::Unbounded => None,
            Limit::Rows(n) => Some(*n),
        }
    }
}

/// A raw ordering clause, emitted verbatim after `ORDER BY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy(String);

impl OrderBy {
    /// Accept `clause` if it is a plain column list, or anything when
    /// `allow_raw` is set. An empty clause means no ordering.
    pub fn parse(clause: &str, allow_raw: bool) -> ResolveResult<Option<Self>> {
        let trimmed = clause.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        if !allow_raw && !ORDER_BY_PATTERN.is_match(trimmed) {
            return Err(ResolveError::invalid_argument(
                ORDER_BY_ARG,
                format!("`{trimmed}` is not a column list"),
            ));
        }
        Ok(Some(OrderBy(trimmed.to_string())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_expr(&self) -> Expr {
        raw_sql(&self.0)
    }
}

/// Which side wins when caller and forced modifiers name the same thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precedence {
    /// Top-level entity queries: the caller's `limit` and `orderBy` override
    /// forced defaults. Forced `where` keys still hold.
    Caller,
    /// Nested relations: the parent-id filter must hold whatever the caller passed.
    Forced,
}

/// `where` / `limit` / `orderBy` of one resolution.
///
/// `None` means "not supplied", so that merging can tell an explicit value
/// apart from the default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryModifiers {
    pub filter: IndexMap<String, ScalarValue>,
    pub limit: Option<Limit>,
    pub order_by: Option<OrderBy>,
}

impl QueryModifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality filter.
    pub fn with_filter(mut self, column: &str, value: impl Into<ScalarValue>) -> Self {
        self.filter.insert(column.into(), value.into());
        self
    }

    pub fn with_limit(mut self, limit: Limit) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    /// Read `where`, `limit` and `orderBy` from field arguments.
    ///
    /// Other arguments are ignored. A `null` argument counts as not supplied.
    pub fn from_arguments(
        arguments: &IndexMap<String, InputValue>,
        allow_raw_order_by: bool,
    ) -> ResolveResult<Self> {
        let mut modifiers = QueryModifiers::default();

        match arguments.get(WHERE_ARG) {
            None | Some(InputValue::Scalar(ScalarValue::Null)) => {}
            Some(InputValue::Object(fields)) => {
                for (column, value) in fields {
                    let scalar = value.as_scalar().ok_or_else(|| {
                        ResolveError::invalid_argument(
                            WHERE_ARG,
                            format!("`{column}` must be a scalar, got {}", value.kind()),
                        )
                    })?;
                    modifiers.filter.insert(column.clone(), scalar.clone());
                }
            }
            Some(other) => {
                return Err(ResolveError::invalid_argument(
                    WHERE_ARG,
                    format!("expected object, got {}", other.kind()),
                ))
            }
        }

        match arguments.get(LIMIT_ARG) {
            None | Some(InputValue::Scalar(ScalarValue::Null)) => {}
            Some(InputValue::Scalar(ScalarValue::Int(n))) => {
                let limit = Limit::from_i64(*n).ok_or_else(|| {
                    ResolveError::invalid_argument(
                        LIMIT_ARG,
                        format!("{n} is negative; use -1 for no limit"),
                    )
                })?;
                modifiers.limit = Some(limit);
            }
            Some(other) => {
                return Err(ResolveError::invalid_argument(
                    LIMIT_ARG,
                    format!("expected integer, got {}", other.kind()),
                ))
            }
        }

        match arguments.get(ORDER_BY_ARG) {
            None | Some(InputValue::Scalar(ScalarValue::Null)) => {}
            Some(InputValue::Scalar(ScalarValue::String(clause))) => {
                modifiers.order_by = OrderBy::parse(clause, allow_raw_order_by)?;
            }
            Some(other) => {
                return Err(ResolveError::invalid_argument(
                    ORDER_BY_ARG,
                    format!("expected string, got {}", other.kind()),
                ))
            }
        }

        Ok(modifiers)
    }

    /// Effective limit once defaults apply.
    pub fn effective_limit(&self) -> Limit {
        self.limit.unwrap_or_default()
    }
}

/// Combine caller and forced modifiers.
///
/// `where` merges per column and a forced column always wins. `limit` and
/// `orderBy` are taken whole from the winning side when it supplied them,
/// else from the other side.
pub fn merge(caller: QueryModifiers, forced: QueryModifiers, precedence: Precedence) -> QueryModifiers {
    let mut filter = caller.filter;
    filter.extend(forced.filter);

    let (limit, order_by) = match precedence {
        Precedence::Caller => (
            caller.limit.or(forced.limit),
            caller.order_by.or(forced.order_by),
        ),
        Precedence::Forced => (
            forced.limit.or(caller.limit),
            forced.order_by.or(caller.order_by),
        ),
    };

    QueryModifiers {
        filter,
        limit,
        order_by,
    }
}
