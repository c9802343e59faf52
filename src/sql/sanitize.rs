//! SQL Identifier, Operator and Literal Sanitization
//!
//! Identifiers cannot be bound as parameters, so every table and column name
//! goes through [`validate_identifier`] before it is spliced into SQL text.
//! Values that must be inlined are rendered by [`quote`].

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{RecordStoreError, Result};
use crate::types::Value;

static IDENTIFIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Comparison operators accepted in condition keys (matched case-insensitively)
pub const ALLOWED_OPERATORS: &[&str] = &[
    "=", "!=", "<>", "<", ">", "<=", ">=", "LIKE", "NOT LIKE", "IS", "IS NOT",
];

/// Validate a table or column name
///
/// Rules:
/// - Must start with an ASCII letter or underscore
/// - Can only contain ASCII letters, digits and underscores
///
/// `context` names what is being validated (e.g. "table", "column") and is
/// carried in the error.
///
/// # Example
/// ```
/// use record_store::sql::validate_identifier;
///
/// assert_eq!(validate_identifier("user_id", "column").unwrap(), "user_id");
/// assert!(validate_identifier("name; DROP TABLE users", "column").is_err());
/// ```
pub fn validate_identifier<'a>(name: &'a str, context: &str) -> Result<&'a str> {
    if IDENTIFIER_RE.is_match(name) {
        Ok(name)
    } else {
        Err(RecordStoreError::invalid_identifier(context, name))
    }
}

/// Validate a comparison operator against [`ALLOWED_OPERATORS`]
///
/// The caller's casing is preserved in the returned token.
///
/// # Example
/// ```
/// use record_store::sql::validate_operator;
///
/// assert_eq!(validate_operator("not like").unwrap(), "not like");
/// assert!(validate_operator("BETWEEN").is_err());
/// ```
pub fn validate_operator(op: &str) -> Result<&str> {
    if ALLOWED_OPERATORS
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(op))
    {
        Ok(op)
    } else {
        Err(RecordStoreError::invalid_operator(op))
    }
}

/// Render a value as an SQL literal
///
/// - `Null` becomes `NULL`
/// - numbers are written unquoted (non-finite floats become `NULL`)
/// - booleans become `1` / `0`
/// - text is wrapped in single quotes with embedded quotes doubled
pub fn quote(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) if f.is_finite() => format!("{:?}", f),
        Value::Float(_) => "NULL".to_string(),
        Value::Boolean(true) => "1".to_string(),
        Value::Boolean(false) => "0".to_string(),
        Value::Text(s) => format!("'{}'", escape_string(s)),
    }
}

/// Double every single quote, without adding surrounding quotes
pub fn escape_string(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // validate_identifier Tests
    // =========================================================================

    #[test]
    fn test_validate_identifier_valid() {
        for name in ["users", "_private", "Table1", "a", "my_long_column_2", "SELECT"] {
            assert_eq!(validate_identifier(name, "column").unwrap(), name);
        }
    }

    #[test]
    fn test_validate_identifier_empty() {
        assert!(validate_identifier("", "table").is_err());
    }

    #[test]
    fn test_validate_identifier_starts_with_number() {
        assert!(validate_identifier("1products", "table").is_err());
        assert!(validate_identifier("0abc", "table").is_err());
    }

    #[test]
    fn test_validate_identifier_whitespace() {
        assert!(validate_identifier("my table", "table").is_err());
        assert!(validate_identifier(" table", "table").is_err());
        assert!(validate_identifier("table\n", "table").is_err());
    }

    #[test]
    fn test_validate_identifier_punctuation() {
        for name in ["my-table", "schema.table", "name'", "a;b", "x\"y", "c@d", "é"] {
            assert!(validate_identifier(name, "column").is_err(), "{}", name);
        }
    }

    #[test]
    fn test_validate_identifier_injection_attempt() {
        let err = validate_identifier("name; DROP TABLE users --", "column").unwrap_err();
        match err {
            RecordStoreError::InvalidIdentifier { context, name } => {
                assert_eq!(context, "column");
                assert_eq!(name, "name; DROP TABLE users --");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    // =========================================================================
    // validate_operator Tests
    // =========================================================================

    #[test]
    fn test_validate_operator_symbols() {
        for op in ["=", "!=", "<>", "<", ">", "<=", ">="] {
            assert_eq!(validate_operator(op).unwrap(), op);
        }
    }

    #[test]
    fn test_validate_operator_preserves_casing() {
        assert_eq!(validate_operator("like").unwrap(), "like");
        assert_eq!(validate_operator("Not Like").unwrap(), "Not Like");
        assert_eq!(validate_operator("is not").unwrap(), "is not");
        assert_eq!(validate_operator("IS").unwrap(), "IS");
    }

    #[test]
    fn test_validate_operator_rejects_unknown() {
        for op in ["", "==", "IN", "BETWEEN", "NOT  LIKE", "= 1; --", "LIKE "] {
            assert!(
                matches!(validate_operator(op), Err(RecordStoreError::InvalidOperator(_))),
                "{}",
                op
            );
        }
    }

    // =========================================================================
    // quote / escape_string Tests
    // =========================================================================

    #[test]
    fn test_quote_scalars() {
        assert_eq!(quote(&Value::Null), "NULL");
        assert_eq!(quote(&Value::Boolean(true)), "1");
        assert_eq!(quote(&Value::Boolean(false)), "0");
        assert_eq!(quote(&Value::Integer(42)), "42");
        assert_eq!(quote(&Value::Integer(-7)), "-7");
    }

    #[test]
    fn test_quote_floats() {
        assert_eq!(quote(&Value::Float(3.5)), "3.5");
        assert_eq!(quote(&Value::Float(2.0)), "2.0");
        assert_eq!(quote(&Value::Float(f64::INFINITY)), "NULL");
    }

    #[test]
    fn test_quote_strings() {
        assert_eq!(quote(&Value::from("Alice")), "'Alice'");
        assert_eq!(quote(&Value::from("O'Brien")), "'O''Brien'");
        assert_eq!(quote(&Value::from("")), "''");
        assert_eq!(quote(&Value::from("'; DROP TABLE x; --")), "'''; DROP TABLE x; --'");
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("it's"), "it''s");
        assert_eq!(escape_string("''"), "''''");
        assert_eq!(escape_string("plain"), "plain");
    }
}
