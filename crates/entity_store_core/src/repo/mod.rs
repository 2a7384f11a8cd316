//! Entity repository contracts and the storage-backed implementation.
//!
//! # Responsibility
//! - Define generic create/update/delete and fetch contracts over entity kinds.
//! - End every mutation with an implicit commit of the working context.
//!
//! # Invariants
//! - Writes validate records against the kind's declaration before staging.
//! - Zero fetch matches is an empty result, never an error.
//! - No retry or partial application: a failed commit fails the call.

use crate::db::DbError;
use crate::fetch::{FetchSpec, FilterError};
use crate::model::entity::Entity;
use crate::model::record::RecordError;
use crate::model::value::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod entity_storage;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error returned by every fallible repository operation.
#[derive(Debug)]
pub enum RepoError {
    /// An operation ran before `EntityStorage::setup`.
    NotSetUp,
    UnknownKind(String),
    /// Record does not fit the kind's declaration; nothing was staged.
    Validation {
        kind: String,
        message: String,
    },
    InvalidFilter {
        kind: String,
        source: FilterError,
    },
    /// Stored record could not be turned into the typed entity.
    Record {
        kind: String,
        source: RecordError,
    },
    /// The engine rejected the pending change set.
    Commit(DbError),
    Query(DbError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotSetUp => write!(f, "entity storage is not set up"),
            Self::UnknownKind(kind) => write!(f, "entity kind `{kind}` is not in the catalog"),
            Self::Validation { kind, message } => write!(f, "invalid `{kind}` record: {message}"),
            Self::InvalidFilter { kind, source } => {
                write!(f, "invalid fetch on `{kind}`: {source}")
            }
            Self::Record { kind, source } => write!(f, "cannot decode `{kind}`: {source}"),
            Self::Commit(err) => write!(f, "commit failed: {err}"),
            Self::Query(err) => write!(f, "query failed: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidFilter { source, .. } => Some(source),
            Self::Record { source, .. } => Some(source),
            Self::Commit(err) | Self::Query(err) => Some(err),
            Self::NotSetUp | Self::UnknownKind(_) | Self::Validation { .. } => None,
        }
    }
}

/// Mutating operations, each followed by a commit.
pub trait EntityStore {
    /// Allocates a new `E`, lets `configure` populate it, then commits.
    ///
    /// Returns the configured instance as stored.
    fn create<E, F>(&mut self, configure: F) -> RepoResult<E>
    where
        E: Entity,
        F: FnOnce(&mut E);

    /// Applies `configure` to a stored entity, then commits. Last write wins.
    fn update<E, F>(&mut self, entity: &mut E, configure: F) -> RepoResult<()>
    where
        E: Entity,
        F: FnOnce(&mut E);

    fn delete<E: Entity>(&mut self, entity: &E) -> RepoResult<()>;
}

/// Read operations in storage order.
pub trait EntityFetcher {
    fn fetch<E: Entity>(&self, spec: &FetchSpec) -> RepoResult<Vec<E>>;

    fn fetch_all<E: Entity>(&self) -> RepoResult<Vec<E>> {
        self.fetch(&FetchSpec::new())
    }

    /// First entity whose identifier equals `id`, if any.
    fn fetch_one_by_id<E: Entity>(&self, id: impl Into<Value>) -> RepoResult<Option<E>> {
        let spec = FetchSpec::new().identifier_equals(id).limit(1);
        Ok(self.fetch(&spec)?.into_iter().next())
    }

    /// First entity whose timestamp field equals `epoch_ms`, if any.
    fn fetch_one_by_date<E: Entity>(&self, epoch_ms: i64) -> RepoResult<Option<E>> {
        let spec = FetchSpec::new().timestamp_equals(epoch_ms).limit(1);
        Ok(self.fetch(&spec)?.into_iter().next())
    }

    /// Entities whose identifier is in `ids`.
    fn fetch_many_by_ids<E, I, V>(&self, ids: I) -> RepoResult<Vec<E>>
    where
        E: Entity,
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.fetch(&FetchSpec::new().identifier_in(ids))
    }
}
