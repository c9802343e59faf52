//! DDL Generation for model tables and their search indexes
//!
//! Generates SQLite DDL for the table backing a model and, when search is
//! enabled, the FTS5 external-content index kept in sync by triggers.

use crate::error::{RecordStoreError, Result};
use crate::sql::sanitize::validate_identifier;
use crate::types::{ColumnSchema, PRIMARY_KEY};

/// DDL Generator for one model table
#[derive(Debug, Clone, Copy)]
pub struct DdlGenerator<'a> {
    table: &'a str,
}

impl<'a> DdlGenerator<'a> {
    /// Create a new DDL generator, validating the table name
    pub fn new(table: &'a str) -> Result<Self> {
        Ok(Self {
            table: validate_identifier(table, "table")?,
        })
    }

    /// Name of the full-text index shadowing this table
    pub fn fts_table(&self) -> String {
        format!("{}_fts", self.table)
    }

    /// Generate CREATE TABLE IF NOT EXISTS with the implicit integer key
    ///
    /// Declared types are upper-cased and otherwise passed through.
    pub fn generate_create_table(&self, schema: &ColumnSchema) -> Result<String> {
        schema.validate()?;

        let mut column_defs = vec![format!("{} INTEGER PRIMARY KEY", PRIMARY_KEY)];
        for (name, sql_type) in schema.columns() {
            column_defs.push(format!("{} {}", name, sql_type.to_uppercase()));
        }

        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.table,
            column_defs.join(", ")
        ))
    }

    /// Generate the statements that create and populate an FTS5 index
    ///
    /// Produces, in order: the virtual table, insert/delete/update triggers
    /// and a `rebuild` command indexing any rows already present.
    pub fn generate_fts_index(&self, columns: &[String]) -> Result<Vec<String>> {
        if columns.is_empty() {
            return Err(RecordStoreError::validation(
                "At least one column is required for a search index",
            ));
        }
        for column in columns {
            validate_identifier(column, "column")?;
        }

        let fts = self.fts_table();
        let table = self.table;
        let cols = columns.join(", ");
        let new_cols = Self::prefixed(columns, "new");
        let old_cols = Self::prefixed(columns, "old");

        Ok(vec![
            format!(
                "CREATE VIRTUAL TABLE IF NOT EXISTS {fts} USING fts5({cols}, content='{table}', content_rowid='{PRIMARY_KEY}')"
            ),
            format!(
                "CREATE TRIGGER IF NOT EXISTS {fts}_ai AFTER INSERT ON {table} BEGIN \
                 INSERT INTO {fts}(rowid, {cols}) VALUES (new.{PRIMARY_KEY}, {new_cols}); END"
            ),
            format!(
                "CREATE TRIGGER IF NOT EXISTS {fts}_ad AFTER DELETE ON {table} BEGIN \
                 INSERT INTO {fts}({fts}, rowid, {cols}) VALUES ('delete', old.{PRIMARY_KEY}, {old_cols}); END"
            ),
            format!(
                "CREATE TRIGGER IF NOT EXISTS {fts}_au AFTER UPDATE ON {table} BEGIN \
                 INSERT INTO {fts}({fts}, rowid, {cols}) VALUES ('delete', old.{PRIMARY_KEY}, {old_cols}); \
                 INSERT INTO {fts}(rowid, {cols}) VALUES (new.{PRIMARY_KEY}, {new_cols}); END"
            ),
            format!("INSERT INTO {fts}({fts}) VALUES ('rebuild')"),
        ])
    }

    /// Generate the statements that remove an FTS5 index and its triggers
    pub fn generate_drop_fts_index(&self) -> Vec<String> {
        let fts = self.fts_table();
        vec![
            format!("DROP TRIGGER IF EXISTS {fts}_ai"),
            format!("DROP TRIGGER IF EXISTS {fts}_ad"),
            format!("DROP TRIGGER IF EXISTS {fts}_au"),
            format!("DROP TABLE IF EXISTS {fts}"),
        ]
    }

    /// Query listing the indexed columns of an existing FTS5 index, in order
    ///
    /// Returns no rows when the index does not exist.
    pub fn fts_columns_query(&self) -> String {
        format!(
            "SELECT name FROM pragma_table_info('{}') ORDER BY cid",
            self.fts_table()
        )
    }

    fn prefixed(columns: &[String], alias: &str) -> String {
        columns
            .iter()
            .map(|c| format!("{}.{}", alias, c))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
