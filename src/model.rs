//! Model - per-table CRUD and aggregate operations
//!
//! A [`Model`] binds a store handle, a table name and a [`ColumnSchema`].
//! It holds no row state; every operation compiles SQL through the
//! statement builder and wraps resulting rows in [`Record`]s.

use tracing::info;

use crate::error::{RecordStoreError, Result};
use crate::record::Record;
use crate::search::indexed_columns;
use crate::sql::condition::build_where;
use crate::sql::ddl::DdlGenerator;
use crate::sql::sanitize::validate_identifier;
use crate::sql::statement::StatementBuilder;
use crate::store::RecordStore;
use crate::types::{Attributes, ColumnSchema, Conditions, Value, ValueMap};

/// Per-table factory for records
#[derive(Debug, Clone)]
pub struct Model {
    store: RecordStore,
    table: String,
    schema: ColumnSchema,
    pub(crate) search_columns: Option<Vec<String>>,
}

impl Model {
    /// Define a model, creating its table (`id INTEGER PRIMARY KEY` plus one
    /// column per schema entry) if it does not already exist
    ///
    /// An existing search index on the table is detected and enabled.
    pub async fn define(store: RecordStore, table: &str, schema: ColumnSchema) -> Result<Self> {
        let ddl = DdlGenerator::new(table)?.generate_create_table(&schema)?;
        store.execute(&ddl).await?;
        let search_columns = indexed_columns(&store, table).await?;

        info!(
            table = %table,
            columns = schema.len(),
            searchable = search_columns.is_some(),
            "model table ensured"
        );

        Ok(Self {
            store,
            table: table.to_string(),
            schema,
            search_columns,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub(crate) fn statements(&self) -> Result<StatementBuilder<'_>> {
        StatementBuilder::new(&self.table)
    }

    pub(crate) fn wrap(&self, row: ValueMap) -> Result<Record> {
        Record::from_row(self.store.clone(), self.table.clone(), row)
    }

    fn wrap_all(&self, rows: Vec<ValueMap>) -> Result<Vec<Record>> {
        rows.into_iter().map(|row| self.wrap(row)).collect()
    }

    // =========================================================================
    // Create / Read
    // =========================================================================

    /// Insert a row and return it as stored, including its assigned id
    pub async fn insert(&self, attrs: &Attributes) -> Result<Record> {
        let statement = self.statements()?.insert(attrs)?;
        let id = self.store.insert_with(&statement).await?;
        self.get(id)
            .await?
            .ok_or(RecordStoreError::Sql(sqlx::Error::RowNotFound))
    }

    /// Fetch a record by primary key
    pub async fn get(&self, id: i64) -> Result<Option<Record>> {
        let statement = self.statements()?.select_by_id(id);
        self.store
            .query_row_with(&statement)
            .await?
            .map(|row| self.wrap(row))
            .transpose()
    }

    /// Fetch every record, in the engine's natural order
    pub async fn list(&self) -> Result<Vec<Record>> {
        let sql = self.statements()?.select(None, "", None)?;
        let rows = self.store.query(&sql).await?;
        self.wrap_all(rows)
    }

    /// Fetch every record matching `conditions`
    ///
    /// An empty condition map matches every row.
    pub async fn filter(&self, conditions: &Conditions) -> Result<Vec<Record>> {
        let clause = build_where(conditions)?;
        let sql = self.statements()?.select(None, &clause, None)?;
        let rows = self.store.query(&sql).await?;
        self.wrap_all(rows)
    }

    /// Fetch the first record matching `conditions`
    pub async fn first(&self, conditions: &Conditions) -> Result<Option<Record>> {
        let clause = build_where(conditions)?;
        let sql = self.statements()?.select(None, &clause, Some(1))?;
        self.store
            .query_row(&sql)
            .await?
            .map(|row| self.wrap(row))
            .transpose()
    }

    // =========================================================================
    // Aggregates
    // =========================================================================

    /// Count rows, optionally restricted by `conditions`
    pub async fn tally(&self, conditions: Option<&Conditions>) -> Result<i64> {
        let clause = match conditions {
            Some(conditions) => build_where(conditions)?,
            None => String::new(),
        };
        let sql = self.statements()?.count(&clause);
        let count = self.store.query_scalar(&sql).await?;
        count.as_i64().ok_or_else(|| {
            RecordStoreError::validation(format!("COUNT returned a non-integer: {}", count))
        })
    }

    /// Whether any row matches `conditions`
    pub async fn exists(&self, conditions: &Conditions) -> Result<bool> {
        Ok(self.tally(Some(conditions)).await? > 0)
    }

    /// Values of a single column across every row
    pub async fn pluck(&self, column: &str) -> Result<Vec<Value>> {
        let column = validate_identifier(column, "column")?;
        let sql = self.statements()?.select(Some(&[column][..]), "", None)?;
        let rows = self.store.query(&sql).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.into_iter().next().map(|(_, value)| value))
            .collect())
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// Invoke `callback` once per record from [`list`](Self::list), in order
    ///
    /// Stops at, and returns, the first callback error.
    pub async fn for_each<F>(&self, mut callback: F) -> Result<()>
    where
        F: FnMut(&Record) -> Result<()>,
    {
        for record in self.list().await? {
            callback(&record)?;
        }
        Ok(())
    }

    /// Map every record from [`list`](Self::list) through `transform`
    pub async fn collect<T, F>(&self, transform: F) -> Result<Vec<T>>
    where
        F: FnMut(Record) -> T,
    {
        Ok(self.list().await?.into_iter().map(transform).collect())
    }

    // =========================================================================
    // Bulk Writes
    // =========================================================================

    /// Delete every row matching `conditions`, returning the count removed
    ///
    /// An empty condition map deletes every row.
    pub async fn destroy(&self, conditions: &Conditions) -> Result<u64> {
        let clause = build_where(conditions)?;
        let sql = self.statements()?.delete(&clause);
        self.store.execute(&sql).await
    }

    /// Set `attrs` on every row matching `conditions`, returning the count changed
    pub async fn update_all(&self, conditions: &Conditions, attrs: &Attributes) -> Result<u64> {
        let clause = build_where(conditions)?;
        let statement = self.statements()?.update(attrs, &clause)?;
        self.store.execute_with(&statement).await
    }
}
