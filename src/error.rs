//! Error types.
//!
//! One enum per concern, each with a `Result` alias. Storage failures are
//! wrapped transparently so they reach the caller with their original
//! message and source.

use thiserror::Error;

/// Errors raised while building a [`crate::schema::SchemaIndex`].
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to parse schema: {0}")]
    Parse(String),

    #[error("Field `{type_name}.{field}` carries more than one relation directive")]
    ConflictingDirectives { type_name: String, field: String },

    #[error("Type `{0}` is defined more than once")]
    DuplicateType(String),

    #[error("Field `{type_name}.{field}` is defined more than once")]
    DuplicateField { type_name: String, field: String },

    #[error("Schema has no `{0}` type")]
    MissingQueryType(String),

    #[error("Field `{type_name}.{field}` contains the reserved `__` delimiter")]
    ReservedFieldName { type_name: String, field: String },
}

pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised by an [`crate::executor::Executor`].
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Connection lock poisoned")]
    LockPoisoned,

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Errors raised while resolving a selection.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Unknown type `{0}`")]
    UnknownType(String),

    #[error("Field `{field}` is not defined on type `{type_name}`")]
    SchemaFieldNotFound { type_name: String, field: String },

    #[error("Query type has no field `{0}`")]
    UnknownQueryField(String),

    #[error("Invalid query document: {0}")]
    InvalidDocument(String),

    #[error("Invalid argument `{argument}`: {message}")]
    InvalidArgument { argument: String, message: String },

    #[error("Cannot resolve `{type_name}.{field}`: parent row has no id")]
    MissingParentId { type_name: String, field: String },

    #[error("Relation `{type_name}.{field}` cannot be selected inside a joined to-one relation")]
    NestedRelationInJoin { type_name: String, field: String },

    #[error(transparent)]
    Storage(#[from] ExecutorError),
}

impl ResolveError {
    pub(crate) fn invalid_argument(argument: &str, message: impl Into<String>) -> Self {
        ResolveError::InvalidArgument {
            argument: argument.to_string(),
            message: message.into(),
        }
    }
}

pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors raised by [`crate::mutation::Mutations`].
#[derive(Debug, Error)]
pub enum MutationError {
    #[error("Mutation on `{table}` requires an id")]
    MissingId { table: String },

    #[error("Mutation on `{table}` has no input columns")]
    EmptyInput { table: String },

    #[error("Post-query hook failed: {0}")]
    Hook(String),

    #[error(transparent)]
    Storage(#[from] ExecutorError),
}

pub type MutationResult<T> = Result<T, MutationError>;

/// Errors raised while issuing a token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No signing secret configured")]
    MissingSecret,

    #[error("Failed to encode token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

pub type AuthResult<T> = Result<T, AuthError>;
