//! Declarative fetch criteria.

use crate::model::value::Value;
use crate::schema::{EntityDescriptor, FieldDescriptor};
use std::fmt::{Display, Formatter};

/// How a predicate names its field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRef {
    Named(String),
    /// The kind's declared identifier field.
    Identifier,
    /// The kind's declared timestamp field.
    Timestamp,
}

impl FieldRef {
    pub(crate) fn resolve<'a>(&self, entity: &'a EntityDescriptor) -> Option<&'a FieldDescriptor> {
        match self {
            Self::Named(name) => entity.field(name),
            Self::Identifier => entity.identifier_field(),
            Self::Timestamp => entity.timestamp_field(),
        }
    }
}

impl Display for FieldRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Identifier => f.write_str("<identifier>"),
            Self::Timestamp => f.write_str("<timestamp>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals { field: FieldRef, value: Value },
    In { field: FieldRef, values: Vec<Value> },
}

/// Filter plus result limit for one fetch.
///
/// Holds at most one predicate; setting a new one replaces the previous.
/// A limit of zero means no limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchSpec {
    predicate: Option<Predicate>,
    limit: Option<u32>,
}

impl FetchSpec {
    /// Matches every entity of the kind.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field_equals(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_predicate(Predicate::Equals {
            field: FieldRef::Named(field.into()),
            value: value.into(),
        })
    }

    pub fn field_in<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.with_predicate(Predicate::In {
            field: FieldRef::Named(field.into()),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    pub fn identifier_equals(self, value: impl Into<Value>) -> Self {
        self.with_predicate(Predicate::Equals {
            field: FieldRef::Identifier,
            value: value.into(),
        })
    }

    pub fn identifier_in<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.with_predicate(Predicate::In {
            field: FieldRef::Identifier,
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// Equality on the kind's timestamp field, in epoch milliseconds.
    pub fn timestamp_equals(self, epoch_ms: i64) -> Self {
        self.with_predicate(Predicate::Equals {
            field: FieldRef::Timestamp,
            value: Value::Timestamp(epoch_ms),
        })
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    pub fn fetch_limit(&self) -> Option<u32> {
        self.limit
    }

    fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }
}
