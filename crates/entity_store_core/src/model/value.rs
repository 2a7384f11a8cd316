//! Field values exchanged between entities and storage.

use crate::schema::FieldType;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// One field value of a record.
///
/// `Timestamp` carries Unix epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Uuid(Uuid),
    Timestamp(i64),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short type label used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::Uuid(_) => "uuid",
            Self::Timestamp(_) => "timestamp",
        }
    }

    /// Converts this value into the canonical shape for `field_type`.
    ///
    /// Returns `None` when the value cannot represent that type. `Null` is
    /// always accepted here; optionality is checked by the caller.
    pub fn coerce_to(self, field_type: FieldType) -> Option<Value> {
        match (field_type, self) {
            (_, Self::Null) => Some(Self::Null),
            (FieldType::Text, value @ Self::Text(_)) => Some(value),
            (FieldType::Integer, value @ Self::Integer(_)) => Some(value),
            (FieldType::Real, value @ Self::Real(_)) => Some(value),
            (FieldType::Real, Self::Integer(value)) => Some(Self::Real(value as f64)),
            (FieldType::Bool, value @ Self::Bool(_)) => Some(value),
            (FieldType::Uuid, value @ Self::Uuid(_)) => Some(value),
            (FieldType::Uuid, Self::Text(text)) => Uuid::parse_str(&text).ok().map(Self::Uuid),
            (FieldType::Timestamp, value @ Self::Timestamp(_)) => Some(value),
            (FieldType::Timestamp, Self::Integer(value)) => Some(Self::Timestamp(value)),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Integer(value) | Self::Timestamp(value) => write!(f, "{value}"),
            Self::Real(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
            Self::Uuid(value) => write!(f, "{value}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Self::Uuid(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
