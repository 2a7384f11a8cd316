//! Value and identifier translation for SQLite statements.

use super::{DbError, DbResult};
use crate::model::record::Record;
use crate::model::value::Value;
use crate::schema::{EntityDescriptor, FieldDescriptor, FieldType};
use rusqlite::types::Value as SqlValue;
use rusqlite::Row;
use uuid::Uuid;

/// Quotes a catalog-validated identifier for use in SQL text.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{name}\"")
}

/// Comma-separated quoted column list in declaration order.
pub(crate) fn column_list(entity: &EntityDescriptor) -> String {
    entity
        .fields
        .iter()
        .map(|field| quote_ident(&field.name))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(value) => SqlValue::Integer(i64::from(*value)),
        Value::Integer(value) | Value::Timestamp(value) => SqlValue::Integer(*value),
        Value::Real(value) => SqlValue::Real(*value),
        Value::Text(value) => SqlValue::Text(value.clone()),
        Value::Uuid(value) => SqlValue::Text(value.to_string()),
    }
}

/// Decodes a row selected with [`column_list`] into a record.
pub(crate) fn decode_row(entity: &EntityDescriptor, row: &Row<'_>) -> DbResult<Record> {
    let mut record = Record::new();
    for (index, field) in entity.fields.iter().enumerate() {
        let raw: SqlValue = row.get(index)?;
        let value = decode_value(entity, field, raw)?;
        record.set(field.name.clone(), value);
    }
    Ok(record)
}

fn decode_value(entity: &EntityDescriptor, field: &FieldDescriptor, raw: SqlValue) -> DbResult<Value> {
    let value = match (field.field_type, raw) {
        (_, SqlValue::Null) => Some(Value::Null),
        (FieldType::Text, SqlValue::Text(text)) => Some(Value::Text(text)),
        (FieldType::Integer, SqlValue::Integer(value)) => Some(Value::Integer(value)),
        (FieldType::Timestamp, SqlValue::Integer(value)) => Some(Value::Timestamp(value)),
        (FieldType::Real, SqlValue::Real(value)) => Some(Value::Real(value)),
        (FieldType::Real, SqlValue::Integer(value)) => Some(Value::Real(value as f64)),
        (FieldType::Bool, SqlValue::Integer(0)) => Some(Value::Bool(false)),
        (FieldType::Bool, SqlValue::Integer(1)) => Some(Value::Bool(true)),
        (FieldType::Uuid, SqlValue::Text(text)) => Uuid::parse_str(&text).ok().map(Value::Uuid),
        _ => None,
    };

    value.ok_or_else(|| {
        DbError::InvalidData(format!(
            "column `{}.{}` does not hold a valid {} value",
            entity.name, field.name, field.field_type
        ))
    })
}
