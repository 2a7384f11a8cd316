//! Translation of a `FetchSpec` into a parameterized SQLite query.

use super::spec::{FetchSpec, FieldRef, Predicate};
use super::FilterError;
use crate::db::sql::{column_list, quote_ident, to_sql_value};
use crate::model::value::Value;
use crate::schema::{EntityDescriptor, FieldDescriptor};
use rusqlite::types::Value as SqlValue;
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SelectQuery {
    pub sql: String,
    pub binds: Vec<SqlValue>,
}

/// Builds the `SELECT` for `spec` against the kind's table, in rowid order.
pub(crate) fn build_select(
    entity: &EntityDescriptor,
    spec: &FetchSpec,
) -> Result<SelectQuery, FilterError> {
    let mut sql = format!(
        "SELECT {} FROM {}",
        column_list(entity),
        quote_ident(&entity.name)
    );
    let mut binds = Vec::new();

    match spec.predicate() {
        None => {}
        Some(Predicate::Equals { field, value }) => {
            let descriptor = resolve(entity, field)?;
            let column = quote_ident(&descriptor.name);
            match coerce(descriptor, value.clone())? {
                Value::Null => sql.push_str(&format!(" WHERE {column} IS NULL")),
                value => {
                    sql.push_str(&format!(" WHERE {column} = ?"));
                    binds.push(to_sql_value(&value));
                }
            }
        }
        Some(Predicate::In { field, values }) => {
            let descriptor = resolve(entity, field)?;
            if values.is_empty() {
                sql.push_str(" WHERE 1 = 0");
            } else {
                let mut members = Vec::with_capacity(values.len());
                for value in values {
                    match coerce(descriptor, value.clone())? {
                        Value::Null => {
                            return Err(FilterError::NullInSet(descriptor.name.clone()));
                        }
                        value => members.push(json_member(&to_sql_value(&value))),
                    }
                }
                // One bind for the whole set keeps large sets under SQLite's variable limit.
                sql.push_str(&format!(
                    " WHERE {} IN (SELECT value FROM json_each(?))",
                    quote_ident(&descriptor.name)
                ));
                binds.push(SqlValue::Text(JsonValue::Array(members).to_string()));
            }
        }
    }

    sql.push_str(" ORDER BY rowid ASC");
    if let Some(limit) = spec.fetch_limit() {
        sql.push_str(" LIMIT ?");
        binds.push(SqlValue::Integer(i64::from(limit)));
    }

    Ok(SelectQuery { sql, binds })
}

fn json_member(value: &SqlValue) -> JsonValue {
    match value {
        SqlValue::Integer(value) => JsonValue::from(*value),
        SqlValue::Real(value) => JsonValue::from(*value),
        SqlValue::Text(value) => JsonValue::from(value.as_str()),
        SqlValue::Null | SqlValue::Blob(_) => JsonValue::Null,
    }
}

fn resolve<'a>(entity: &'a EntityDescriptor, field: &FieldRef) -> Result<&'a FieldDescriptor, FilterError> {
    field
        .resolve(entity)
        .ok_or_else(|| FilterError::UnknownField(field.to_string()))
}

fn coerce(field: &FieldDescriptor, value: Value) -> Result<Value, FilterError> {
    let actual = value.type_name();
    value
        .coerce_to(field.field_type)
        .ok_or_else(|| FilterError::TypeMismatch {
            field: field.name.clone(),
            expected: field.field_type,
            actual,
        })
}
