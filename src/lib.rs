//! # record-store
//!
//! A lightweight relational-mapping layer over an embedded SQLite database.
//!
//! Column schemas and flat condition maps are compiled into SQL text, executed
//! against a single connection, and returned as [`Record`]s that can save and
//! delete themselves.
//!
//! ## Features
//!
//! - **Models**: one per table, with insert/get/list/filter/first, counting,
//!   plucking, bulk update and bulk delete
//! - **Self-persisting records**: edit fields in memory, then `save()` or `delete()`
//! - **Condition maps**: keys are `"column"` (equality) or `"column <op>"`,
//!   AND-joined in insertion order
//! - **Injection safety**: identifiers and operators are checked against an
//!   allow-list before any SQL is sent; written values are bound as parameters
//! - **Full-text search**: optional FTS5 index per model
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use record_store::{Attributes, ColumnSchema, Conditions, RecordStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = RecordStore::in_memory().await?;
//!
//!     let users = store
//!         .model(
//!             "users",
//!             ColumnSchema::new().column("name", "text").column("age", "integer"),
//!         )
//!         .await?;
//!
//!     let mut alice = users
//!         .insert(&Attributes::new().with("name", "Alice").with("age", 30))
//!         .await?;
//!
//!     alice.set("age", 31)?;
//!     alice.save().await?;
//!
//!     let adults = users.filter(&Conditions::new().with("age >=", 18)).await?;
//!     assert_eq!(adults.len(), 1);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use std::time::Duration;
//! use record_store::StoreConfig;
//!
//! let config = StoreConfig::builder("sqlite://app.db")
//!     .wal(true)                              // WAL journal (default)
//!     .foreign_keys(true)                     // enforce foreign keys (default)
//!     .busy_timeout(Duration::from_secs(10))  // wait on locked database
//!     .build();
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod record;
pub mod search;
pub mod sql;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use config::{StoreConfig, StoreConfigBuilder};
pub use error::{RecordStoreError, Result};
pub use model::Model;
pub use record::Record;
pub use search::{Annotations, SearchHit, SearchOptions};
pub use store::RecordStore;
pub use types::{Attributes, ColumnSchema, Conditions, PRIMARY_KEY, Value, ValueMap};

// Re-export SQL utilities for advanced users
pub use sql::condition::build_where;
pub use sql::sanitize::{escape_string, quote, validate_identifier, validate_operator};
