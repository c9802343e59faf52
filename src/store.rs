//! RecordStore - connection to the embedded SQLite store
//!
//! Owns the single database connection shared by every [`Model`] and
//! [`Record`](crate::record::Record) created from it, and exposes the raw
//! execute/query surface they compile down to.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqliteRow,
};
use sqlx::{Column, ConnectOptions, Row, Sqlite, TypeInfo, ValueRef};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::{RecordStoreError, Result};
use crate::model::Model;
use crate::sql::statement::Statement;
use crate::types::{ColumnSchema, Value, ValueMap};

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Handle to an embedded SQLite database
///
/// Cloning is cheap; all clones share one connection. Statements run one at
/// a time in the order callers acquire the connection.
#[derive(Clone)]
pub struct RecordStore {
    /// The single database connection
    conn: Arc<Mutex<SqliteConnection>>,
    /// Store configuration
    config: Arc<StoreConfig>,
}

impl fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RecordStore {
    /// Open the database described by `config`
    ///
    /// Journal mode, foreign key enforcement and busy timeout are applied
    /// while the connection is established.
    pub async fn new(config: StoreConfig) -> Result<Self> {
        let mut options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| {
                RecordStoreError::Connection(format!("Invalid database URL: {}", e))
            })?
            .foreign_keys(config.foreign_keys)
            .busy_timeout(config.busy_timeout)
            .create_if_missing(config.create_if_missing);
        if config.wal {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let conn = options.connect().await.map_err(|e| {
            RecordStoreError::Connection(format!("Database connection failed: {}", e))
        })?;

        info!(
            url = %config.database_url,
            wal = config.wal,
            foreign_keys = config.foreign_keys,
            "record store opened"
        );

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            config: Arc::new(config),
        })
    }

    /// Open a private in-memory database
    pub async fn in_memory() -> Result<Self> {
        Self::new(StoreConfig::in_memory()).await
    }

    /// Get the store configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Define a model, creating its table if it does not exist
    pub async fn model(&self, table: &str, schema: ColumnSchema) -> Result<Model> {
        Model::define(self.clone(), table, schema).await
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Execute a statement, returning the number of affected rows
    pub async fn execute(&self, sql: &str) -> Result<u64> {
        self.execute_with(&Statement::raw(sql)).await
    }

    /// Execute a parameterized statement, returning the number of affected rows
    pub async fn execute_with(&self, statement: &Statement) -> Result<u64> {
        debug!(sql = %statement.sql, params = statement.params.len(), "execute");
        let mut conn = self.conn.lock().await;
        let result = bind_params(sqlx::query(&statement.sql), &statement.params)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Execute an INSERT, returning the rowid it assigned
    pub async fn insert_with(&self, statement: &Statement) -> Result<i64> {
        debug!(sql = %statement.sql, params = statement.params.len(), "insert");
        let mut conn = self.conn.lock().await;
        let result = bind_params(sqlx::query(&statement.sql), &statement.params)
            .execute(&mut *conn)
            .await?;
        Ok(result.last_insert_rowid())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Run a query, returning every row
    pub async fn query(&self, sql: &str) -> Result<Vec<ValueMap>> {
        self.query_with(&Statement::raw(sql)).await
    }

    /// Run a parameterized query, returning every row
    pub async fn query_with(&self, statement: &Statement) -> Result<Vec<ValueMap>> {
        debug!(sql = %statement.sql, params = statement.params.len(), "query");
        let rows = {
            let mut conn = self.conn.lock().await;
            bind_params(sqlx::query(&statement.sql), &statement.params)
                .fetch_all(&mut *conn)
                .await?
        };
        rows.iter().map(decode_row).collect()
    }

    /// Run a query, returning the first row if any
    pub async fn query_row(&self, sql: &str) -> Result<Option<ValueMap>> {
        self.query_row_with(&Statement::raw(sql)).await
    }

    /// Run a parameterized query, returning the first row if any
    pub async fn query_row_with(&self, statement: &Statement) -> Result<Option<ValueMap>> {
        debug!(sql = %statement.sql, params = statement.params.len(), "query_row");
        let row = {
            let mut conn = self.conn.lock().await;
            bind_params(sqlx::query(&statement.sql), &statement.params)
                .fetch_optional(&mut *conn)
                .await?
        };
        row.as_ref().map(decode_row).transpose()
    }

    /// Run a query, returning the first column of the first row
    ///
    /// Yields `Value::Null` when the query returns no rows.
    pub async fn query_scalar(&self, sql: &str) -> Result<Value> {
        let row = self.query_row(sql).await?;
        Ok(row
            .and_then(|row| row.into_iter().next())
            .map(|(_, value)| value)
            .unwrap_or(Value::Null))
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    /// Run `callback` between `BEGIN` and `COMMIT`
    ///
    /// The callback receives a handle to this store. If it fails, or the
    /// commit fails, the transaction is rolled back and the error is returned
    /// wrapped in [`RecordStoreError::TransactionFailed`].
    pub async fn transaction<F, Fut, T>(&self, callback: F) -> Result<T>
    where
        F: FnOnce(RecordStore) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.execute("BEGIN").await?;

        let outcome = match callback(self.clone()).await {
            Ok(value) => match self.execute("COMMIT").await {
                Ok(_) => return Ok(value),
                Err(err) => err,
            },
            Err(err) => err,
        };

        warn!(error = %outcome, "rolling back transaction");
        if let Err(rollback_err) = self.execute("ROLLBACK").await {
            warn!(error = %rollback_err, "rollback failed");
        }
        Err(RecordStoreError::TransactionFailed(Box::new(outcome)))
    }
}

/// Bind values to `?` placeholders in order
fn bind_params<'q>(mut query: SqliteQuery<'q>, params: &'q [Value]) -> SqliteQuery<'q> {
    for value in params {
        query = match value {
            Value::Null => query.bind(None::<i64>),
            Value::Boolean(b) => query.bind(*b),
            Value::Integer(i) => query.bind(*i),
            Value::Float(f) => query.bind(*f),
            Value::Text(s) => query.bind(s.as_str()),
        };
    }
    query
}

/// Decode a row by the storage class of each value
///
/// Booleans have no storage class of their own and come back as integers.
/// TEXT and BLOB values are both read as bytes and decoded as UTF-8, with
/// invalid sequences replaced.
fn decode_row(row: &SqliteRow) -> Result<ValueMap> {
    let mut fields = ValueMap::with_capacity(row.columns().len());
    for column in row.columns() {
        let idx = column.ordinal();
        let storage_class = {
            let raw = row.try_get_raw(idx)?;
            if raw.is_null() {
                None
            } else {
                Some(raw.type_info().name().to_string())
            }
        };

        let value = match storage_class.as_deref() {
            None => Value::Null,
            Some("INTEGER") | Some("BOOLEAN") => Value::Integer(row.try_get_unchecked(idx)?),
            Some("REAL") => Value::Float(row.try_get_unchecked(idx)?),
            Some(_) => {
                let bytes: Vec<u8> = row.try_get_unchecked(idx)?;
                Value::Text(match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
                })
            }
        };
        fields.insert(column.name(), value);
    }
    Ok(fields)
}
