//! Error types for record store operations

use thiserror::Error;

/// Errors that can occur while compiling or executing record store operations
#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("Invalid {context} identifier: '{name}'")]
    InvalidIdentifier { context: String, name: String },

    #[error("Invalid operator: '{0}'")]
    InvalidOperator(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Record {0} has been deleted")]
    RecordDeleted(i64),

    #[error("Search is not enabled for table: {0}")]
    SearchNotEnabled(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(#[source] Box<RecordStoreError>),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Connection error: {0}")]
    Connection(String),
}

impl RecordStoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_identifier(context: impl Into<String>, name: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            context: context.into(),
            name: name.into(),
        }
    }

    pub fn invalid_operator(op: impl Into<String>) -> Self {
        Self::InvalidOperator(op.into())
    }

    /// True for the errors raised before any SQL reaches the store
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier { .. } | Self::InvalidOperator(_) | Self::Validation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RecordStoreError>;
