//! SQLite executor backed by rusqlite.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::Connection;

use super::{ExecOutcome, Executor};
use crate::error::{ExecutorError, ExecutorResult};
use crate::sql::dialect::Dialect;
use crate::value::{Row, ScalarValue};

/// SQLite database shared by every clone of this handle.
///
/// rusqlite calls block, so each statement runs on tokio's blocking pool.
/// Statements are serialized on the single connection.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteExecutor {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> ExecutorResult<Self> {
        Ok(Self::from_connection(Connection::open(path)?))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> ExecutorResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run several `;`-separated statements synchronously (schema setup, seeding).
    pub fn execute_batch(&self, sql: &str) -> ExecutorResult<()> {
        let conn = self.conn.lock().map_err(|_| ExecutorError::LockPoisoned)?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    async fn with_connection<T, F>(&self, f: F) -> ExecutorResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> ExecutorResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| ExecutorError::LockPoisoned)?;
            f(&conn)
        })
        .await?
    }
}

#[async_trait]
impl Executor for SqliteExecutor {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn fetch_all(&self, sql: &str) -> ExecutorResult<Vec<Row>> {
        log::trace!("sqlite query: {sql}");
        let sql = sql.to_string();
        self.with_connection(move |conn| fetch_rows(conn, &sql)).await
    }

    async fn execute(&self, sql: &str) -> ExecutorResult<ExecOutcome> {
        log::trace!("sqlite execute: {sql}");
        let sql = sql.to_string();
        self.with_connection(move |conn| {
            let rows_affected = conn.execute(&sql, [])?;
            Ok(ExecOutcome {
                rows_affected: rows_affected as u64,
                last_insert_id: Some(conn.last_insert_rowid()),
            })
        })
        .await
    }
}

fn fetch_rows(conn: &Connection, sql: &str) -> ExecutorResult<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();

    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Row::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            record.insert(name.clone(), scalar(name, row.get_ref(i)?)?);
        }
        out.push(record);
    }
    Ok(out)
}

fn scalar(column: &str, value: ValueRef<'_>) -> ExecutorResult<ScalarValue> {
    Ok(match value {
        ValueRef::Null => ScalarValue::Null,
        ValueRef::Integer(n) => ScalarValue::Int(n),
        ValueRef::Real(f) => ScalarValue::Float(f),
        ValueRef::Text(bytes) => ScalarValue::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(_) => {
            return Err(ExecutorError::Unsupported(format!(
                "column `{column}` holds a BLOB"
            )))
        }
    })
}
