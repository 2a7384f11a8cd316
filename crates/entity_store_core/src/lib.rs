//! Generic entity repository over an embedded SQLite store.
//!
//! Entity kinds are declared schema-first in a catalog; callers create,
//! update, delete and fetch them through `EntityStorage` without the
//! repository knowing any kind-specific field.

pub mod db;
pub mod fetch;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schema;
pub mod store;

pub use fetch::{FetchSpec, FieldRef, FilterError, Predicate};
pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LoggingError};
pub use model::entity::Entity;
pub use model::record::{Record, RecordError};
pub use model::value::Value;
pub use repo::entity_storage::EntityStorage;
pub use repo::{EntityFetcher, EntityStore, RepoError, RepoResult};
pub use schema::{
    EntityDescriptor, FieldDescriptor, FieldType, SchemaCatalog, SchemaError, SchemaSource,
};
pub use store::{Context, OpenError, PendingChange, PersistenceStore, StoreOptions};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
