//! SQL utilities for the record store
//!
//! Provides identifier/operator validation, literal quoting, WHERE-clause
//! compilation, and DDL/DML statement generation.

pub mod condition;
pub mod ddl;
pub mod sanitize;
pub mod statement;

pub use condition::{build_where, where_suffix};
pub use ddl::DdlGenerator;
pub use sanitize::{ALLOWED_OPERATORS, escape_string, quote, validate_identifier, validate_operator};
pub use statement::{Statement, StatementBuilder};
