//! SQLite engine bootstrap and low-level table access.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the entity store.
//! - Materialize the schema catalog as one table per entity kind.
//! - Translate between `Value`s and SQLite column values.
//!
//! # Invariants
//! - Catalog version is tracked via `PRAGMA user_version`.
//! - No entity data is read or written before the catalog is applied.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod catalog;
mod open;
pub(crate) mod sql;

pub use open::{open_db, open_db_in_memory, DEFAULT_BUSY_TIMEOUT};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Store was written with another catalog version; migration is not supported.
    SchemaVersionMismatch {
        stored: u32,
        declared: u32,
    },
    MissingRequiredColumn {
        table: String,
        column: String,
    },
    /// Update/delete target no longer exists in storage.
    MissingObject {
        kind: String,
        key: String,
    },
    UnknownKind(String),
    InvalidData(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::SchemaVersionMismatch { stored, declared } => write!(
                f,
                "store schema version {stored} does not match catalog version {declared}"
            ),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "table `{table}` is missing required column `{column}`")
            }
            Self::MissingObject { kind, key } => {
                write!(f, "no stored `{kind}` with identifier `{key}`")
            }
            Self::UnknownKind(kind) => write!(f, "entity kind `{kind}` is not in the catalog"),
            Self::InvalidData(message) => write!(f, "invalid stored data: {message}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
