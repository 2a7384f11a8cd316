//! Kind-agnostic field map used at the storage boundary.

use super::value::Value;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Conversion failures between a `Record` and a typed entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    MissingField(String),
    WrongType {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "record has no value for `{field}`"),
            Self::WrongType {
                field,
                expected,
                actual,
            } => write!(f, "field `{field}` holds {actual}, expected {expected}"),
        }
    }
}

impl Error for RecordError {}

/// Field name to value mapping for one entity instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Builder form of [`Record::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn text(&self, name: &str) -> Result<String, RecordError> {
        match self.require(name)? {
            Value::Text(value) => Ok(value.clone()),
            other => Err(wrong_type(name, "text", other)),
        }
    }

    pub fn opt_text(&self, name: &str) -> Result<Option<String>, RecordError> {
        self.optional(name, |record| record.text(name))
    }

    pub fn integer(&self, name: &str) -> Result<i64, RecordError> {
        match self.require(name)? {
            Value::Integer(value) => Ok(*value),
            other => Err(wrong_type(name, "integer", other)),
        }
    }

    pub fn opt_integer(&self, name: &str) -> Result<Option<i64>, RecordError> {
        self.optional(name, |record| record.integer(name))
    }

    pub fn real(&self, name: &str) -> Result<f64, RecordError> {
        match self.require(name)? {
            Value::Real(value) => Ok(*value),
            Value::Integer(value) => Ok(*value as f64),
            other => Err(wrong_type(name, "real", other)),
        }
    }

    pub fn opt_real(&self, name: &str) -> Result<Option<f64>, RecordError> {
        self.optional(name, |record| record.real(name))
    }

    pub fn boolean(&self, name: &str) -> Result<bool, RecordError> {
        match self.require(name)? {
            Value::Bool(value) => Ok(*value),
            other => Err(wrong_type(name, "bool", other)),
        }
    }

    pub fn opt_boolean(&self, name: &str) -> Result<Option<bool>, RecordError> {
        self.optional(name, |record| record.boolean(name))
    }

    pub fn uuid(&self, name: &str) -> Result<Uuid, RecordError> {
        match self.require(name)? {
            Value::Uuid(value) => Ok(*value),
            other => Err(wrong_type(name, "uuid", other)),
        }
    }

    pub fn opt_uuid(&self, name: &str) -> Result<Option<Uuid>, RecordError> {
        self.optional(name, |record| record.uuid(name))
    }

    /// Reads epoch milliseconds from a timestamp (or plain integer) field.
    pub fn timestamp(&self, name: &str) -> Result<i64, RecordError> {
        match self.require(name)? {
            Value::Timestamp(value) | Value::Integer(value) => Ok(*value),
            other => Err(wrong_type(name, "timestamp", other)),
        }
    }

    pub fn opt_timestamp(&self, name: &str) -> Result<Option<i64>, RecordError> {
        self.optional(name, |record| record.timestamp(name))
    }

    fn require(&self, name: &str) -> Result<&Value, RecordError> {
        self.fields
            .get(name)
            .ok_or_else(|| RecordError::MissingField(name.to_string()))
    }

    fn optional<T>(
        &self,
        name: &str,
        read: impl FnOnce(&Self) -> Result<T, RecordError>,
    ) -> Result<Option<T>, RecordError> {
        match self.fields.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => read(self).map(Some),
        }
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

fn wrong_type(name: &str, expected: &'static str, actual: &Value) -> RecordError {
    RecordError::WrongType {
        field: name.to_string(),
        expected,
        actual: actual.type_name(),
    }
}
