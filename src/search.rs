//! Full-text search over model tables
//!
//! [`Model::searchable`] attaches an FTS5 external-content index to the
//! model's table; [`Model::search`] queries it. Ranking, snippet and
//! highlight output is returned in [`Annotations`] next to each record, never
//! mixed into the record's own fields.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::error::{RecordStoreError, Result};
use crate::model::Model;
use crate::record::Record;
use crate::sql::ddl::DdlGenerator;
use crate::sql::sanitize::{escape_string, validate_identifier};
use crate::store::RecordStore;
use crate::types::{PRIMARY_KEY, Value};

// Aliases contain a space, so no validated column name can equal them
const RANK_ALIAS: &str = "search rank";
const SNIPPET_ALIAS: &str = "search snippet";
const HIGHLIGHT_PREFIX: &str = "search highlight ";

/// Options controlling a [`Model::search`] call
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum number of hits (default: unlimited)
    pub limit: Option<u32>,
    /// Indexed column to extract a snippet from
    pub snippet_column: Option<String>,
    /// Approximate snippet length in tokens (default: 16)
    pub snippet_tokens: u32,
    /// Indexed columns to return with matches marked up
    pub highlight: Vec<String>,
    /// Text inserted before each match (default: `<mark>`)
    pub open_marker: String,
    /// Text inserted after each match (default: `</mark>`)
    pub close_marker: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: None,
            snippet_column: None,
            snippet_tokens: 16,
            highlight: Vec::new(),
            open_marker: "<mark>".to_string(),
            close_marker: "</mark>".to_string(),
        }
    }
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn snippet(mut self, column: impl Into<String>) -> Self {
        self.snippet_column = Some(column.into());
        self
    }

    pub fn snippet_tokens(mut self, tokens: u32) -> Self {
        self.snippet_tokens = tokens;
        self
    }

    pub fn highlight(mut self, column: impl Into<String>) -> Self {
        self.highlight.push(column.into());
        self
    }

    pub fn markers(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.open_marker = open.into();
        self.close_marker = close.into();
        self
    }
}

/// Search output that is not part of the row itself
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    /// FTS5 rank; lower is a better match
    pub rank: f64,
    pub snippet: Option<String>,
    /// Highlighted text per requested column
    pub highlights: BTreeMap<String, String>,
}

/// A matching record and its annotations
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub record: Record,
    pub annotations: Annotations,
}

impl Model {
    /// Index `columns` for full-text search
    ///
    /// Creates `<table>_fts` with triggers that keep it in step with the
    /// table, then indexes existing rows. Safe to call again with the same
    /// columns; an index over different columns is dropped and rebuilt.
    ///
    /// The index is picked up by models defined for the table afterwards.
    /// Clones of a model taken before this call stay unsearchable.
    pub async fn searchable(&mut self, columns: &[&str]) -> Result<()> {
        for column in columns {
            validate_identifier(column, "column")?;
            if !self.schema().contains(column) {
                return Err(RecordStoreError::validation(format!(
                    "Cannot index unknown column '{}' of '{}'",
                    column,
                    self.table()
                )));
            }
        }

        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let ddl = DdlGenerator::new(self.table())?;
        let statements = ddl.generate_fts_index(&columns)?;

        if let Some(existing) = indexed_columns(self.store(), self.table()).await? {
            if existing != columns {
                debug!(table = %self.table(), previous = ?existing, "replacing search index");
                for statement in &ddl.generate_drop_fts_index() {
                    self.store().execute(statement).await?;
                }
            }
        }
        for statement in &statements {
            self.store().execute(statement).await?;
        }

        info!(table = %self.table(), columns = ?columns, "search index ready");
        self.search_columns = Some(columns);
        Ok(())
    }

    /// Columns covered by the search index, if one was configured
    pub fn search_columns(&self) -> Option<&[String]> {
        self.search_columns.as_deref()
    }

    /// Run an FTS5 query, best matches first
    ///
    /// `query` uses FTS5 query syntax. A blank query returns no hits.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchHit>> {
        let columns = self
            .search_columns()
            .ok_or_else(|| RecordStoreError::SearchNotEnabled(self.table().to_string()))?;
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let sql = self.build_search_sql(columns, query, options)?;
        let rows = self.store().query(&sql).await?;

        rows.into_iter()
            .map(|mut row| -> Result<SearchHit> {
                let rank = row
                    .remove(RANK_ALIAS)
                    .and_then(|v| v.as_f64())
                    .unwrap_or_default();
                let snippet = row.remove(SNIPPET_ALIAS).and_then(into_text);
                let highlights = options
                    .highlight
                    .iter()
                    .filter_map(|column| {
                        let text = row.remove(&format!("{}{}", HIGHLIGHT_PREFIX, column))?;
                        into_text(text).map(|text| (column.clone(), text))
                    })
                    .collect();

                Ok(SearchHit {
                    record: self.wrap(row)?,
                    annotations: Annotations {
                        rank,
                        snippet,
                        highlights,
                    },
                })
            })
            .collect()
    }

    fn build_search_sql(
        &self,
        columns: &[String],
        query: &str,
        options: &SearchOptions,
    ) -> Result<String> {
        let table = validate_identifier(self.table(), "table")?;
        let fts = format!("{}_fts", table);
        let open = escape_string(&options.open_marker);
        let close = escape_string(&options.close_marker);

        let column_index = |column: &str| -> Result<usize> {
            columns.iter().position(|c| c == column).ok_or_else(|| {
                RecordStoreError::validation(format!("Column '{}' is not indexed", column))
            })
        };

        let mut projection = vec![
            format!("{}.*", table),
            format!("{}.rank AS \"{}\"", fts, RANK_ALIAS),
        ];
        if let Some(column) = &options.snippet_column {
            projection.push(format!(
                "snippet({}, {}, '{}', '{}', '...', {}) AS \"{}\"",
                fts,
                column_index(column)?,
                open,
                close,
                options.snippet_tokens,
                SNIPPET_ALIAS
            ));
        }
        for column in &options.highlight {
            projection.push(format!(
                "highlight({}, {}, '{}', '{}') AS \"{}{}\"",
                fts,
                column_index(column)?,
                open,
                close,
                HIGHLIGHT_PREFIX,
                column
            ));
        }

        let mut sql = format!(
            "SELECT {} FROM {fts} JOIN {table} ON {table}.{PRIMARY_KEY} = {fts}.rowid \
             WHERE {fts} MATCH '{}' ORDER BY {fts}.rank",
            projection.join(", "),
            escape_string(query),
        );
        if let Some(limit) = options.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        Ok(sql)
    }
}

/// Columns of the existing search index for `table`, if there is one
pub(crate) async fn indexed_columns(
    store: &RecordStore,
    table: &str,
) -> Result<Option<Vec<String>>> {
    let sql = DdlGenerator::new(table)?.fts_columns_query();
    let columns: Vec<String> = store
        .query(&sql)
        .await?
        .into_iter()
        .filter_map(|row| row.get("name").and_then(Value::as_str).map(str::to_string))
        .collect();
    Ok((!columns.is_empty()).then_some(columns))
}

fn into_text(value: Value) -> Option<String> {
    match value {
        Value::Text(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_options_defaults() {
        let options = SearchOptions::default();
        assert_eq!(options.limit, None);
        assert_eq!(options.snippet_tokens, 16);
        assert_eq!(options.open_marker, "<mark>");
        assert!(options.highlight.is_empty());
    }

    #[test]
    fn test_search_options_builder() {
        let options = SearchOptions::new()
            .limit(5)
            .snippet("body")
            .highlight("title")
            .markers("[", "]");

        assert_eq!(options.limit, Some(5));
        assert_eq!(options.snippet_column.as_deref(), Some("body"));
        assert_eq!(options.highlight, vec!["title".to_string()]);
        assert_eq!(options.open_marker, "[");
        assert_eq!(options.close_marker, "]");
    }

    #[test]
    fn test_into_text() {
        assert_eq!(into_text(Value::from("x")), Some("x".to_string()));
        assert_eq!(into_text(Value::Null), None);
        assert_eq!(into_text(Value::Integer(3)), Some("3".to_string()));
    }
}
