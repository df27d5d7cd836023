//! # Graphweave
//!
//! Declarative GraphQL-to-SQL resolution over a relational database.
//!
//! ## Architecture
//!
//! Relations are declared once in the schema with `@toOne`, `@toMany` and
//! `@toManyMany` (plus `@first` for pivot naming). A selection is then
//! resolved with one SQL statement per level:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        SDL with relation directives                      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [schema]
//! ┌─────────────────────────────────────────────────────────┐
//! │     SchemaIndex (type -> field -> relation kind)         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [selection]  ◀── GraphQL document
//! ┌─────────────────────────────────────────────────────────┐
//! │  ClassifiedSelection (scalars, to-one, to-many, pivot)   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [builder]
//! ┌─────────────────────────────────────────────────────────┐
//! │   SQL statement (to-one relations as LEFT JOINs)         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [executor]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Flat rows ──[reshape]──▶ nested objects                │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [resolver]
//! ┌─────────────────────────────────────────────────────────┐
//! │   to-many relations resolved per parent, attached by id  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use graphweave::prelude::*;
//!
//! let schema = Arc::new(SchemaIndex::from_sdl(SDL)?);
//! let db: Arc<dyn Executor> = Arc::new(SqliteExecutor::open("blog.db")?);
//! let resolver = Resolver::new(schema, db);
//!
//! let fields = parse_operation("{ posts(limit: 5) { title author { name } } }", None, &Variables::new())?;
//! let posts = resolver
//!     .query(&EntityQuery::new("Post", "posts"), &fields[0], &ResolveContext::guest())
//!     .await?;
//! println!("{}", posts.to_json());
//! ```

pub mod auth;
pub mod builder;
pub mod config;
pub mod error;
pub mod executor;
pub mod modifiers;
pub mod mutation;
pub mod reshape;
pub mod resolver;
pub mod schema;
pub mod selection;
pub mod sql;
pub mod value;

pub use sql::dialect;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::auth::{Identity, TokenAuthority};
    pub use crate::builder::{Statement, StatementBuilder};
    pub use crate::config::Settings;
    pub use crate::dialect::Dialect;
    pub use crate::error::{
        ExecutorError, MutationError, ResolveError, ResolveResult, SchemaError,
    };
    pub use crate::executor::{ExecOutcome, Executor, SqliteExecutor};
    pub use crate::modifiers::{Limit, OrderBy, QueryModifiers};
    pub use crate::mutation::{DeleteOutcome, MutationConfig, Mutations};
    pub use crate::resolver::{EntityQuery, ResolveContext, Resolver, ResolverOptions};
    pub use crate::schema::{FieldDef, RelationKind, SchemaIndex, SchemaType, TypeRef};
    pub use crate::selection::document::{parse_operation, Variables};
    pub use crate::selection::{Cardinality, SelectionNode};
    pub use crate::value::{InputValue, ResultObject, Row, ScalarValue, Value};
}
