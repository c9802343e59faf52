//! Condition building for SQL WHERE clauses
//!
//! Compiles a flat [`Conditions`] map into an `AND`-joined clause. A key is
//! either a bare column (`"name"`, implying `=`) or a column followed by a
//! single space and an operator (`"age >="`, `"title NOT LIKE"`).

use crate::error::Result;
use crate::sql::sanitize::{quote, validate_identifier, validate_operator};
use crate::types::{Conditions, Value};

/// Build the WHERE clause body (without the `WHERE` keyword)
///
/// Fragments follow the map's insertion order. An empty map yields an empty
/// string. The first invalid key aborts compilation.
///
/// # Example
/// ```
/// use record_store::{Conditions, sql::build_where};
///
/// let conditions = Conditions::new().with("name", "Alice").with("age >=", 18);
/// assert_eq!(build_where(&conditions).unwrap(), "name = 'Alice' AND age >= 18");
/// ```
pub fn build_where(conditions: &Conditions) -> Result<String> {
    let mut fragments = Vec::with_capacity(conditions.len());
    for (key, value) in conditions.iter() {
        fragments.push(build_fragment(key, value)?);
    }
    Ok(fragments.join(" AND "))
}

/// Compile one condition key/value pair
fn build_fragment(key: &str, value: &Value) -> Result<String> {
    let (column, operator) = match key.split_once(' ') {
        Some((column, operator)) => (
            validate_identifier(column, "column")?,
            validate_operator(operator)?,
        ),
        None => (validate_identifier(key, "column")?, "="),
    };
    Ok(format!("{} {} {}", column, operator, quote(value)))
}

/// Render ` WHERE <clause>`, or nothing for an empty clause
pub fn where_suffix(clause: &str) -> String {
    if clause.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clause)
    }
}
