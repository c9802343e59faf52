//! Record - one self-persisting table row
//!
//! A [`Record`] is a snapshot of a row taken when it was read. Field edits
//! stay in memory until [`Record::save`]; two records for the same row never
//! see each other's unsaved edits.
//!
//! After [`Record::delete`] the record is marked deleted and every further
//! persistence call (`save`, `delete`, `reload`) fails with
//! [`RecordStoreError::RecordDeleted`]. Clones taken before the delete are
//! separate snapshots and are not marked.

use crate::error::{RecordStoreError, Result};
use crate::sql::sanitize::validate_identifier;
use crate::sql::statement::StatementBuilder;
use crate::store::RecordStore;
use crate::types::{Attributes, PRIMARY_KEY, Value, ValueMap};

/// Field names never written back by [`Record::save`]
pub const RESERVED_FIELDS: &[&str] = &[PRIMARY_KEY];

/// One row of a model's table, bound to the store it came from
#[derive(Debug, Clone)]
pub struct Record {
    store: RecordStore,
    table: String,
    id: i64,
    fields: ValueMap,
    deleted: bool,
}

impl Record {
    /// Wrap a decoded row; the row must carry an integer `id`
    pub(crate) fn from_row(store: RecordStore, table: String, fields: ValueMap) -> Result<Self> {
        let id = fields
            .get(PRIMARY_KEY)
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                RecordStoreError::validation(format!(
                    "Row from '{}' has no integer '{}' column",
                    table, PRIMARY_KEY
                ))
            })?;

        Ok(Self {
            store,
            table,
            id,
            fields,
            deleted: false,
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Every field of the row, `id` included, in column order
    pub fn fields(&self) -> &ValueMap {
        &self.fields
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    /// Assign a field in memory; `id` cannot be changed
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> Result<()> {
        validate_identifier(column, "column")?;
        if RESERVED_FIELDS.contains(&column) {
            return Err(RecordStoreError::validation(format!(
                "Field '{}' is read-only",
                column
            )));
        }
        self.fields.insert(column, value);
        Ok(())
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Fields that `save` writes: everything except [`RESERVED_FIELDS`]
    pub fn persisted_fields(&self) -> Attributes {
        self.fields
            .iter()
            .filter(|(column, _)| !RESERVED_FIELDS.contains(column))
            .collect()
    }

    /// The row as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(column, value)| (column.to_string(), value.to_json()))
                .collect(),
        )
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Write every non-reserved field back to the row keyed by `id`
    ///
    /// Last write wins; the row is not checked for concurrent changes.
    pub async fn save(&mut self) -> Result<()> {
        self.ensure_live()?;
        let attrs = self.persisted_fields();
        if attrs.is_empty() {
            return Ok(());
        }
        let statement = StatementBuilder::new(&self.table)?.update_by_id(&attrs, self.id)?;
        self.store.execute_with(&statement).await?;
        Ok(())
    }

    /// Remove the row keyed by `id` and mark this record deleted
    pub async fn delete(&mut self) -> Result<()> {
        self.ensure_live()?;
        let statement = StatementBuilder::new(&self.table)?.delete_by_id(self.id);
        self.store.execute_with(&statement).await?;
        self.deleted = true;
        Ok(())
    }

    /// Replace in-memory fields with the stored row
    ///
    /// Returns `false`, leaving fields untouched, when the row no longer exists.
    pub async fn reload(&mut self) -> Result<bool> {
        self.ensure_live()?;
        let statement = StatementBuilder::new(&self.table)?.select_by_id(self.id);
        match self.store.query_row_with(&statement).await? {
            Some(row) => {
                self.fields = row;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn ensure_live(&self) -> Result<()> {
        if self.deleted {
            Err(RecordStoreError::RecordDeleted(self.id))
        } else {
            Ok(())
        }
    }
}
