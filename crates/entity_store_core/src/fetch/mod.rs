//! Fetch specifications and their translation to storage queries.
//!
//! # Responsibility
//! - Describe which entities of one kind to retrieve (filter + limit).
//! - Resolve field references against the kind's declaration at call time.
//!
//! # Invariants
//! - At most one predicate per specification; no AND/OR composition.
//! - Filter values are bound as parameters, never spliced into SQL text.

use crate::schema::FieldType;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub(crate) mod query;
mod spec;

pub use spec::{FetchSpec, FieldRef, Predicate};

/// A fetch specification that cannot be applied to the target kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    UnknownField(String),
    TypeMismatch {
        field: String,
        expected: FieldType,
        actual: &'static str,
    },
    /// Set membership cannot test for null.
    NullInSet(String),
}

impl Display for FilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField(field) => write!(f, "unknown field `{field}`"),
            Self::TypeMismatch {
                field,
                expected,
                actual,
            } => write!(f, "field `{field}` expects {expected}, got {actual}"),
            Self::NullInSet(field) => write!(f, "set filter on `{field}` contains null"),
        }
    }
}

impl Error for FilterError {}
