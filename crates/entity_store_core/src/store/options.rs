//! Store configuration.

use crate::db::DEFAULT_BUSY_TIMEOUT;
use crate::schema::SchemaSource;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything needed to open one persistent store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Catalog name, also the expected `name` inside the catalog.
    pub schema_name: String,
    /// Location hint the catalog is loaded from.
    pub schema_source: SchemaSource,
    /// Store file. `None` keeps the store in memory for the handle lifetime.
    pub store_path: Option<PathBuf>,
    pub busy_timeout: Duration,
}

impl StoreOptions {
    /// In-memory store for the named catalog.
    pub fn new(schema_name: impl Into<String>, schema_source: SchemaSource) -> Self {
        Self {
            schema_name: schema_name.into(),
            schema_source,
            store_path: None,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_store_path(mut self, path: impl AsRef<Path>) -> Self {
        self.store_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.store_path.is_none()
    }
}
