//! Persistence handle: storage connection lifecycle and working context.
//!
//! # Responsibility
//! - Turn `StoreOptions` into an open, catalog-backed store.
//! - Stage changes in one context and commit them all-or-nothing.
//!
//! # Invariants
//! - One context per handle; no per-call isolation.
//! - Pending changes survive a failed commit until rolled back.

use crate::db::DbError;
use crate::schema::SchemaError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod context;
mod options;
mod persistence;

pub use context::{Context, PendingChange};
pub use options::StoreOptions;
pub use persistence::PersistenceStore;

/// Failure to bring a store up.
#[derive(Debug)]
pub enum OpenError {
    Schema(SchemaError),
    Db(DbError),
}

impl Display for OpenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schema(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OpenError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Schema(err) => Some(err),
            Self::Db(err) => Some(err),
        }
    }
}

impl From<SchemaError> for OpenError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<DbError> for OpenError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}
