//! Configuration for RecordStore
//!
//! Provides a builder pattern for configuring the store connection.

use std::time::Duration;

/// URL of a private, in-memory SQLite database
pub const IN_MEMORY_URL: &str = "sqlite::memory:";

/// Configuration for the record store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// SQLite database URL (e.g. `sqlite://data.db` or `sqlite::memory:`)
    pub database_url: String,
    /// Whether to switch the journal to write-ahead logging at open time
    pub wal: bool,
    /// Whether to enforce foreign key constraints
    pub foreign_keys: bool,
    /// How long a writer waits on a locked database before failing
    pub busy_timeout: Duration,
    /// Whether to create the database file when it does not exist
    pub create_if_missing: bool,
}

impl StoreConfig {
    /// Create a new configuration builder
    pub fn builder(database_url: impl Into<String>) -> StoreConfigBuilder {
        StoreConfigBuilder::new(database_url)
    }

    /// Default configuration for a private in-memory database
    pub fn in_memory() -> Self {
        StoreConfigBuilder::new(IN_MEMORY_URL).build()
    }
}

/// Builder for StoreConfig
#[derive(Debug)]
pub struct StoreConfigBuilder {
    database_url: String,
    wal: bool,
    foreign_keys: bool,
    busy_timeout: Duration,
    create_if_missing: bool,
}

impl StoreConfigBuilder {
    /// Create a new builder with the database URL
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            wal: true,
            foreign_keys: true,
            busy_timeout: Duration::from_secs(5),
            create_if_missing: true,
        }
    }

    /// Enable or disable WAL journal mode (default: true)
    pub fn wal(mut self, enabled: bool) -> Self {
        self.wal = enabled;
        self
    }

    /// Enable or disable foreign key enforcement (default: true)
    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    /// Set the busy timeout (default: 5 seconds)
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Create the database file if missing (default: true)
    pub fn create_if_missing(mut self, enabled: bool) -> Self {
        self.create_if_missing = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> StoreConfig {
        StoreConfig {
            database_url: self.database_url,
            wal: self.wal,
            foreign_keys: self.foreign_keys,
            busy_timeout: self.busy_timeout,
            create_if_missing: self.create_if_missing,
        }
    }
}
