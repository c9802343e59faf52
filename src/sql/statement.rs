//! DML statement building
//!
//! Produces INSERT/SELECT/UPDATE/DELETE text for one table. Written values
//! travel as bound parameters in [`Statement::params`]; filter values arrive
//! already inlined in a clause compiled by [`build_where`](super::build_where).

use crate::error::{RecordStoreError, Result};
use crate::sql::condition::where_suffix;
use crate::sql::sanitize::validate_identifier;
use crate::types::{Attributes, PRIMARY_KEY, Value};

/// SQL text plus the values bound to its `?` placeholders, in order
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// A statement with no bound parameters
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }
}

/// Statement builder for a single, validated table
#[derive(Debug, Clone, Copy)]
pub struct StatementBuilder<'a> {
    table: &'a str,
}

impl<'a> StatementBuilder<'a> {
    /// Create a builder, validating the table name
    pub fn new(table: &'a str) -> Result<Self> {
        Ok(Self {
            table: validate_identifier(table, "table")?,
        })
    }

    pub fn table(&self) -> &'a str {
        self.table
    }

    /// `INSERT INTO t (a, b) VALUES (?, ?)`, or `DEFAULT VALUES` when empty
    pub fn insert(&self, attrs: &Attributes) -> Result<Statement> {
        if attrs.is_empty() {
            return Ok(Statement::raw(format!(
                "INSERT INTO {} DEFAULT VALUES",
                self.table
            )));
        }

        let mut columns = Vec::with_capacity(attrs.len());
        let mut params = Vec::with_capacity(attrs.len());
        for (column, value) in attrs.iter() {
            columns.push(validate_identifier(column, "column")?);
            params.push(value.clone());
        }

        let placeholders = vec!["?"; columns.len()].join(", ");
        Ok(Statement::new(
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.table,
                columns.join(", "),
                placeholders
            ),
            params,
        ))
    }

    /// `SELECT <columns> FROM t [WHERE clause] [LIMIT n]`
    ///
    /// `columns` of `None` selects every column.
    pub fn select(
        &self,
        columns: Option<&[&str]>,
        clause: &str,
        limit: Option<u32>,
    ) -> Result<String> {
        let projection = match columns {
            Some(columns) if !columns.is_empty() => columns
                .iter()
                .map(|c| validate_identifier(c, "column"))
                .collect::<Result<Vec<_>>>()?
                .join(", "),
            _ => "*".to_string(),
        };

        let mut sql = format!(
            "SELECT {} FROM {}{}",
            projection,
            self.table,
            where_suffix(clause)
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        Ok(sql)
    }

    /// `SELECT * FROM t WHERE id = ?`
    pub fn select_by_id(&self, id: i64) -> Statement {
        Statement::new(
            format!("SELECT * FROM {} WHERE {} = ?", self.table, PRIMARY_KEY),
            vec![Value::Integer(id)],
        )
    }

    /// `SELECT COUNT(*) FROM t [WHERE clause]`
    pub fn count(&self, clause: &str) -> String {
        format!("SELECT COUNT(*) FROM {}{}", self.table, where_suffix(clause))
    }

    /// `UPDATE t SET a = ?, b = ? [WHERE clause]`
    pub fn update(&self, attrs: &Attributes, clause: &str) -> Result<Statement> {
        let (assignments, params) = Self::assignments(attrs)?;
        Ok(Statement::new(
            format!(
                "UPDATE {} SET {}{}",
                self.table,
                assignments,
                where_suffix(clause)
            ),
            params,
        ))
    }

    /// `UPDATE t SET a = ?, b = ? WHERE id = ?`
    pub fn update_by_id(&self, attrs: &Attributes, id: i64) -> Result<Statement> {
        let (assignments, mut params) = Self::assignments(attrs)?;
        params.push(Value::Integer(id));
        Ok(Statement::new(
            format!(
                "UPDATE {} SET {} WHERE {} = ?",
                self.table, assignments, PRIMARY_KEY
            ),
            params,
        ))
    }

    /// `DELETE FROM t [WHERE clause]`
    pub fn delete(&self, clause: &str) -> String {
        format!("DELETE FROM {}{}", self.table, where_suffix(clause))
    }

    /// `DELETE FROM t WHERE id = ?`
    pub fn delete_by_id(&self, id: i64) -> Statement {
        Statement::new(
            format!("DELETE FROM {} WHERE {} = ?", self.table, PRIMARY_KEY),
            vec![Value::Integer(id)],
        )
    }

    fn assignments(attrs: &Attributes) -> Result<(String, Vec<Value>)> {
        if attrs.is_empty() {
            return Err(RecordStoreError::validation(
                "At least one column is required in an update",
            ));
        }

        let mut parts = Vec::with_capacity(attrs.len());
        let mut params = Vec::with_capacity(attrs.len() + 1);
        for (column, value) in attrs.iter() {
            parts.push(format!("{} = ?", validate_identifier(column, "column")?));
            params.push(value.clone());
        }
        Ok((parts.join(", "), params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> StatementBuilder<'static> {
        StatementBuilder::new("users").unwrap()
    }

    // ==================== Table Validation ====================

    #[test]
    fn test_invalid_table_rejected() {
        assert!(matches!(
            StatementBuilder::new("users; --"),
            Err(RecordStoreError::InvalidIdentifier { context, .. }) if context == "table"
        ));
    }

    // ==================== INSERT ====================

    #[test]
    fn test_insert() {
        let attrs = Attributes::new().with("name", "Alice").with("age", 30);
        let stmt = users().insert(&attrs).unwrap();

        assert_eq!(stmt.sql, "INSERT INTO users (name, age) VALUES (?, ?)");
        assert_eq!(stmt.params, vec![Value::from("Alice"), Value::Integer(30)]);
    }

    #[test]
    fn test_insert_default_values() {
        let stmt = users().insert(&Attributes::new()).unwrap();
        assert_eq!(stmt.sql, "INSERT INTO users DEFAULT VALUES");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_insert_invalid_column() {
        let attrs = Attributes::new().with("name) VALUES ('x'); --", "y");
        assert!(users().insert(&attrs).is_err());
    }

    // ==================== SELECT ====================

    #[test]
    fn test_select_all() {
        assert_eq!(users().select(None, "", None).unwrap(), "SELECT * FROM users");
    }

    #[test]
    fn test_select_with_clause_and_limit() {
        let sql = users().select(None, "age >= 18", Some(1)).unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE age >= 18 LIMIT 1");
    }

    #[test]
    fn test_select_projection() {
        let sql = users().select(Some(&["name"][..]), "", None).unwrap();
        assert_eq!(sql, "SELECT name FROM users");
        assert!(users().select(Some(&["na me"][..]), "", None).is_err());
    }

    #[test]
    fn test_select_by_id() {
        let stmt = users().select_by_id(7);
        assert_eq!(stmt.sql, "SELECT * FROM users WHERE id = ?");
        assert_eq!(stmt.params, vec![Value::Integer(7)]);
    }

    #[test]
    fn test_count() {
        assert_eq!(users().count(""), "SELECT COUNT(*) FROM users");
        assert_eq!(
            users().count("name = 'x'"),
            "SELECT COUNT(*) FROM users WHERE name = 'x'"
        );
    }

    // ==================== UPDATE ====================

    #[test]
    fn test_update_with_clause() {
        let attrs = Attributes::new().with("active", false).with("note", "O'Brien");
        let stmt = users().update(&attrs, "age < 18").unwrap();

        assert_eq!(stmt.sql, "UPDATE users SET active = ?, note = ? WHERE age < 18");
        assert_eq!(
            stmt.params,
            vec![Value::Boolean(false), Value::from("O'Brien")]
        );
    }

    #[test]
    fn test_update_by_id_appends_key_param() {
        let attrs = Attributes::new().with("name", "Bob");
        let stmt = users().update_by_id(&attrs, 3).unwrap();

        assert_eq!(stmt.sql, "UPDATE users SET name = ? WHERE id = ?");
        assert_eq!(stmt.params, vec![Value::from("Bob"), Value::Integer(3)]);
    }

    #[test]
    fn test_update_requires_columns() {
        let err = users().update(&Attributes::new(), "").unwrap_err();
        assert!(err.is_validation());
    }

    // ==================== DELETE ====================

    #[test]
    fn test_delete() {
        assert_eq!(users().delete(""), "DELETE FROM users");
        assert_eq!(users().delete("age > 99"), "DELETE FROM users WHERE age > 99");
    }

    #[test]
    fn test_delete_by_id() {
        let stmt = users().delete_by_id(9);
        assert_eq!(stmt.sql, "DELETE FROM users WHERE id = ?");
        assert_eq!(stmt.params, vec![Value::Integer(9)]);
    }
}
