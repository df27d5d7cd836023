//! SQL Statement Builder.
//!
//! Turns one resolution level (table, scalar columns, to-one joins,
//! modifiers, optional pivot join) into a single [`Query`].
//!
//! Naming conventions:
//!
//! | Relation | Table | Join / filter |
//! |----------|-------|---------------|
//! | to-one `author: User` on `posts` | `users AS author` | `posts.authorId = author.id` |
//! | to-many `comments: [Comment]` on `Post` | `comments` | `comments.postId = <parent id>` |
//! | to-many-to-many `tags: [Tag]` on `posts` | pivot `tags_posts` (`posts_tags` with `@first`) | `tags AS tag ON tags_posts.tagId = tag.id`, `tags_posts.postId = <parent id>` |

use crate::modifiers::{Limit, QueryModifiers};
use crate::reshape::nested_alias;
use crate::selection::{Cardinality, ClassifiedSelection};
use crate::sql::dialect::Dialect;
use crate::sql::expr::{eq_value, table_col, ExprExt};
use crate::sql::query::{Query, TableRef};

/// Primary key column every entity table carries.
pub const ID_COLUMN: &str = "id";

/// Table holding rows of `type_name`: `User` -> `users`.
pub fn entity_table(type_name: &str) -> String {
    format!("{}s", type_name.to_lowercase())
}

/// Foreign key column pointing at `name`: `post` -> `postId`.
pub fn foreign_key(name: &str) -> String {
    format!("{name}Id")
}

/// Table of a to-many relation: the lowercased field name.
pub fn to_many_table(field: &str) -> String {
    field.to_lowercase()
}

/// Pivot table between `table` and the many-to-many `field`.
///
/// `first` puts `table` first: `posts_tags`; otherwise `tags_posts`.
pub fn pivot_table(table: &str, field: &str, first: bool) -> String {
    let field = field.to_lowercase();
    if first {
        format!("{table}_{field}")
    } else {
        format!("{field}_{table}")
    }
}

/// A to-one relation flattened into the statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ToOneJoin {
    pub relation: String,
    pub target_type: String,
    pub columns: Vec<String>,
}

/// A built statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub query: Query,
    /// `id` was selected only so relations can be attached; strip it afterwards.
    pub hidden_id: bool,
}

impl Statement {
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.query.to_sql(dialect)
    }
}

/// Builder for one resolution level.
#[derive(Debug, Clone)]
#[must_use = "builders have no effect until build() is called"]
pub struct StatementBuilder {
    table: String,
    pivot_target: Option<String>,
    columns: Vec<String>,
    joins: Vec<ToOneJoin>,
    modifiers: QueryModifiers,
    cardinality: Cardinality,
    ensure_id: bool,
}

impl StatementBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.into(),
            pivot_target: None,
            columns: Vec::new(),
            joins: Vec::new(),
            modifiers: QueryModifiers::default(),
            cardinality: Cardinality::Many,
            ensure_id: false,
        }
    }

    /// Builder pre-filled from a classified selection.
    pub fn for_selection(table: &str, selection: &ClassifiedSelection<'_>) -> Self {
        let mut builder = Self::new(table).ensure_id(selection.has_many_relations());
        builder.columns = selection.scalars.iter().map(|c| c.to_string()).collect();
        for join in &selection.to_one {
            builder = builder.to_one(
                &join.field.name,
                &join.field.ty.name,
                join.columns.iter().map(|c| c.to_string()).collect(),
            );
        }
        builder
    }

    /// Treat `table` as a pivot and join the entity table of `target_type` through it.
    pub fn pivot_join(mut self, target_type: &str) -> Self {
        self.pivot_target = Some(target_type.into());
        self
    }

    pub fn column(mut self, column: &str) -> Self {
        self.columns.push(column.into());
        self
    }

    pub fn to_one(mut self, relation: &str, target_type: &str, columns: Vec<String>) -> Self {
        self.joins.push(ToOneJoin {
            relation: relation.into(),
            target_type: target_type.into(),
            columns,
        });
        self
    }

    pub fn modifiers(mut self, modifiers: QueryModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    /// Select `id` even when the caller did not ask for it.
    pub fn ensure_id(mut self, ensure: bool) -> Self {
        self.ensure_id = ensure;
        self
    }

    pub fn build(&self) -> Statement {
        let mut query = Query::new().from(TableRef::new(&self.table));

        // Pivot: rows come from the pivot table, columns from the joined entity.
        let current = match &self.pivot_target {
            Some(target) => {
                let alias = target.to_lowercase();
                query = query.left_join(
                    TableRef::new(&entity_table(target)).with_alias(&alias),
                    table_col(&self.table, &foreign_key(&alias)).eq(table_col(&alias, ID_COLUMN)),
                );
                alias
            }
            None => self.table.clone(),
        };

        for (column, value) in &self.modifiers.filter {
            query = query.filter(eq_value(table_col(&self.table, column), value));
        }

        let limit = match (self.cardinality, self.modifiers.effective_limit()) {
            (Cardinality::One, Limit::Rows(0)) => Some(0),
            (Cardinality::One, _) => Some(1),
            (Cardinality::Many, limit) => limit.rows(),
        };
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        if let Some(order_by) = &self.modifiers.order_by {
            query = query.order_by(order_by.to_expr());
        }

        for column in &self.columns {
            query = query.add_select(table_col(&current, column));
        }

        for join in &self.joins {
            if join.columns.is_empty() {
                continue;
            }
            query = query.left_join(
                TableRef::new(&entity_table(&join.target_type)).with_alias(&join.relation),
                table_col(&current, &foreign_key(&join.relation))
                    .eq(table_col(&join.relation, ID_COLUMN)),
            );
            for column in &join.columns {
                query = query.add_select(
                    table_col(&join.relation, column).alias(&nested_alias(&join.relation, column)),
                );
            }
        }

        let has_id = self.columns.iter().any(|c| c == ID_COLUMN);
        let hidden_id = !has_id && (self.ensure_id || query.select.is_empty());
        if hidden_id {
            query = query.add_select(table_col(&current, ID_COLUMN));
        }

        Statement { query, hidden_id }
    }
}
