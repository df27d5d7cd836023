//! Create, update and delete helpers over an [`Executor`].
//!
//! Each mutation optionally rewrites its input with an [`InputReducer`]
//! before writing and runs a [`PostQuery`] hook afterwards. Create and
//! update return the row as stored, read back by id.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;

use crate::builder::ID_COLUMN;
use crate::error::{MutationError, MutationResult};
use crate::executor::Executor;
use crate::resolver::ResolveContext;
use crate::sql::dml::{Delete, Insert, Update};
use crate::sql::expr::{col, eq_value, Expr};
use crate::sql::query::{Query, TableRef};
use crate::value::{Row, ScalarValue};

/// Rewrites mutation input before it is written.
pub type InputReducer = Arc<dyn Fn(Row, &ResolveContext) -> Row + Send + Sync>;

/// Runs after a successful write with the row id and the caller's input.
pub type PostQuery = Arc<
    dyn for<'a> Fn(&'a dyn Executor, &'a ScalarValue, &'a Row) -> BoxFuture<'a, MutationResult<()>>
        + Send
        + Sync,
>;

/// Per-mutation hooks.
#[derive(Clone, Default)]
pub struct MutationConfig {
    pub input_reducer: Option<InputReducer>,
    pub post_query: Option<PostQuery>,
}

impl MutationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input_reducer<F>(mut self, f: F) -> Self
    where
        F: Fn(Row, &ResolveContext) -> Row + Send + Sync + 'static,
    {
        self.input_reducer = Some(Arc::new(f));
        self
    }

    pub fn with_post_query<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(&'a dyn Executor, &'a ScalarValue, &'a Row) -> BoxFuture<'a, MutationResult<()>>
            + Send
            + Sync
            + 'static,
    {
        self.post_query = Some(Arc::new(f));
        self
    }

    fn reduce(&self, input: Row, ctx: &ResolveContext) -> Row {
        match &self.input_reducer {
            Some(reducer) => reducer(input, ctx),
            None => input,
        }
    }

    async fn after(&self, executor: &dyn Executor, id: &ScalarValue, input: &Row) -> MutationResult<()> {
        match &self.post_query {
            Some(hook) => hook(executor, id, input).await,
            None => Ok(()),
        }
    }
}

impl fmt::Debug for MutationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationConfig")
            .field("input_reducer", &self.input_reducer.is_some())
            .field("post_query", &self.post_query.is_some())
            .finish()
    }
}

/// Result of [`Mutations::hard_delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub result: bool,
}

/// Mutation entry points sharing one executor.
#[derive(Clone)]
pub struct Mutations {
    executor: Arc<dyn Executor>,
}

impl Mutations {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    /// Insert `input` into `table` and return the stored row.
    ///
    /// The new id is the input's own `id` when it carries one, otherwise
    /// the one the database generated.
    pub async fn create(
        &self,
        table: &str,
        input: Row,
        config: &MutationConfig,
        ctx: &ResolveContext,
    ) -> MutationResult<Option<Row>> {
        let values = config.reduce(input.clone(), ctx);
        if values.is_empty() {
            return Err(MutationError::EmptyInput {
                table: table.to_string(),
            });
        }

        let insert = Insert::into(table)
            .columns(values.keys().cloned())
            .values(values.values().cloned().map(Expr::from));
        let outcome = self.executor.execute(&insert.to_sql(self.executor.dialect())).await?;

        let id = match values.get(ID_COLUMN).filter(|id| !id.is_null()) {
            Some(id) => id.clone(),
            None => outcome
                .last_insert_id
                .map(ScalarValue::Int)
                .ok_or_else(|| MutationError::MissingId {
                    table: table.to_string(),
                })?,
        };
        log::debug!("created {table} {id}");

        config.after(self.executor.as_ref(), &id, &input).await?;
        self.select_by_id(table, &id).await
    }

    /// Update the row `id` of `table` and return it as stored.
    pub async fn update(
        &self,
        table: &str,
        id: &ScalarValue,
        input: Row,
        config: &MutationConfig,
        ctx: &ResolveContext,
    ) -> MutationResult<Option<Row>> {
        if id.is_null() {
            return Err(MutationError::MissingId {
                table: table.to_string(),
            });
        }

        let values = config.reduce(input.clone(), ctx);
        if values.is_empty() {
            return Err(MutationError::EmptyInput {
                table: table.to_string(),
            });
        }

        let update = values
            .iter()
            .fold(Update::table(table), |update, (column, value)| {
                update.set(column.as_str(), value.clone())
            })
            .filter(eq_value(col(ID_COLUMN), id));
        let outcome = self.executor.execute(&update.to_sql(self.executor.dialect())).await?;
        log::debug!("updated {table} {id}: {} row(s)", outcome.rows_affected);

        config.after(self.executor.as_ref(), id, &input).await?;
        self.select_by_id(table, id).await
    }

    /// Delete the row `id` of `table`.
    ///
    /// The post hook receives an empty input.
    pub async fn hard_delete(
        &self,
        table: &str,
        id: &ScalarValue,
        config: &MutationConfig,
    ) -> MutationResult<DeleteOutcome> {
        if id.is_null() {
            return Err(MutationError::MissingId {
                table: table.to_string(),
            });
        }

        let delete = Delete::from(table).filter(eq_value(col(ID_COLUMN), id));
        let outcome = self.executor.execute(&delete.to_sql(self.executor.dialect())).await?;
        log::debug!("deleted {table} {id}: {} row(s)", outcome.rows_affected);

        config.after(self.executor.as_ref(), id, &Row::new()).await?;
        Ok(DeleteOutcome { result: true })
    }

    async fn select_by_id(&self, table: &str, id: &ScalarValue) -> MutationResult<Option<Row>> {
        let query = Query::new()
            .select_star()
            .from(TableRef::new(table))
            .filter(eq_value(col(ID_COLUMN), id))
            .limit(1);
        Ok(self
            .executor
            .fetch_optional(&query.to_sql(self.executor.dialect()))
            .await?)
    }
}
