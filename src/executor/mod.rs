//! Database seam.
//!
//! The resolver and the mutation helpers only ever talk to an [`Executor`]:
//! hand it a finished SQL string, get rows back. The connection (or pool)
//! behind it is owned by the surrounding service and injected at
//! construction.
//!
//! # Example
//!
//! ```ignore
//! use graphweave::executor::{Executor, SqliteExecutor};
//!
//! let db = SqliteExecutor::open_in_memory()?;
//! db.execute_batch("CREATE TABLE posts (id INTEGER PRIMARY KEY, title TEXT)")?;
//! let rows = db.fetch_all("SELECT id, title FROM posts").await?;
//! ```

mod sqlite;

pub use sqlite::SqliteExecutor;

use async_trait::async_trait;

use crate::error::ExecutorResult;
use crate::sql::dialect::Dialect;
use crate::value::Row;

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    pub rows_affected: u64,
    /// Id generated by an INSERT, when the driver reports one.
    pub last_insert_id: Option<i64>,
}

/// Runs SQL statements against one database.
///
/// Implementations must allow concurrent calls; the resolver fans out
/// sibling sub-resolutions.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Dialect statements for this database are rendered in.
    fn dialect(&self) -> Dialect;

    /// Run a query and return every row, columns in select order.
    async fn fetch_all(&self, sql: &str) -> ExecutorResult<Vec<Row>>;

    /// Run a statement that returns no rows.
    async fn execute(&self, sql: &str) -> ExecutorResult<ExecOutcome>;

    /// Run a query and return its first row, if any.
    async fn fetch_optional(&self, sql: &str) -> ExecutorResult<Option<Row>> {
        Ok(self.fetch_all(sql).await?.into_iter().next())
    }
}
