//! Working context staging changes until the next save.
//!
//! # Responsibility
//! - Keep pending inserts, updates and deletes in staging order.
//! - Apply the whole change set in one engine transaction on save.
//!
//! # Invariants
//! - A failed save leaves storage untouched and every change still pending.
//! - A successful save empties the context.

use crate::db::sql::{column_list, quote_ident, to_sql_value};
use crate::db::{DbError, DbResult};
use crate::model::record::Record;
use crate::model::value::Value;
use crate::schema::{EntityDescriptor, SchemaCatalog};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, Transaction};

/// One staged mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingChange {
    Insert {
        kind: String,
        record: Record,
    },
    /// `key` is the identifier value the row had before the change.
    Update {
        kind: String,
        key: Value,
        record: Record,
    },
    Delete {
        kind: String,
        key: Value,
    },
}

impl PendingChange {
    pub fn kind(&self) -> &str {
        match self {
            Self::Insert { kind, .. } | Self::Update { kind, .. } | Self::Delete { kind, .. } => {
                kind
            }
        }
    }
}

/// The mutable working set every repository operation goes through.
#[derive(Debug, Default)]
pub struct Context {
    pending: Vec<PendingChange>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: impl Into<String>, record: Record) {
        self.pending.push(PendingChange::Insert {
            kind: kind.into(),
            record,
        });
    }

    pub fn update(&mut self, kind: impl Into<String>, key: Value, record: Record) {
        self.pending.push(PendingChange::Update {
            kind: kind.into(),
            key,
            record,
        });
    }

    pub fn delete(&mut self, kind: impl Into<String>, key: Value) {
        self.pending.push(PendingChange::Delete {
            kind: kind.into(),
            key,
        });
    }

    pub fn has_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn pending(&self) -> &[PendingChange] {
        &self.pending
    }

    /// Discards every pending change.
    pub fn rollback(&mut self) -> usize {
        let discarded = self.pending.len();
        self.pending.clear();
        discarded
    }

    /// Commits all pending changes atomically and returns how many were applied.
    pub(crate) fn save(&mut self, conn: &mut Connection, catalog: &SchemaCatalog) -> DbResult<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }

        let tx = conn.transaction()?;
        for change in &self.pending {
            apply_change(&tx, catalog, change)?;
        }
        tx.commit()?;

        let applied = self.pending.len();
        self.pending.clear();
        Ok(applied)
    }
}

fn apply_change(tx: &Transaction<'_>, catalog: &SchemaCatalog, change: &PendingChange) -> DbResult<()> {
    let entity = catalog
        .entity(change.kind())
        .ok_or_else(|| DbError::UnknownKind(change.kind().to_string()))?;

    match change {
        PendingChange::Insert { record, .. } => insert_row(tx, entity, record),
        PendingChange::Update { key, record, .. } => update_row(tx, entity, key, record),
        PendingChange::Delete { key, .. } => delete_row(tx, entity, key),
    }
}

fn insert_row(tx: &Transaction<'_>, entity: &EntityDescriptor, record: &Record) -> DbResult<()> {
    let placeholders = (1..=entity.fields.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({placeholders});",
        quote_ident(&entity.name),
        column_list(entity)
    );

    let mut stmt = tx.prepare_cached(&sql)?;
    stmt.execute(params_from_iter(row_values(entity, record)))?;
    Ok(())
}

fn update_row(
    tx: &Transaction<'_>,
    entity: &EntityDescriptor,
    key: &Value,
    record: &Record,
) -> DbResult<()> {
    let assignments = entity
        .fields
        .iter()
        .enumerate()
        .map(|(index, field)| format!("{} = ?{}", quote_ident(&field.name), index + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE {} SET {assignments} WHERE {} = ?{};",
        quote_ident(&entity.name),
        quote_ident(&entity.identifier),
        entity.fields.len() + 1
    );

    let mut values = row_values(entity, record);
    values.push(to_sql_value(key));

    let mut stmt = tx.prepare_cached(&sql)?;
    let changed = stmt.execute(params_from_iter(values))?;
    if changed == 0 {
        return Err(missing_object(entity, key));
    }
    Ok(())
}

fn delete_row(tx: &Transaction<'_>, entity: &EntityDescriptor, key: &Value) -> DbResult<()> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = ?1;",
        quote_ident(&entity.name),
        quote_ident(&entity.identifier)
    );

    let mut stmt = tx.prepare_cached(&sql)?;
    let changed = stmt.execute([to_sql_value(key)])?;
    if changed == 0 {
        return Err(missing_object(entity, key));
    }
    Ok(())
}

fn row_values(entity: &EntityDescriptor, record: &Record) -> Vec<SqlValue> {
    entity
        .fields
        .iter()
        .map(|field| record.get(&field.name).map_or(SqlValue::Null, to_sql_value))
        .collect()
}

fn missing_object(entity: &EntityDescriptor, key: &Value) -> DbError {
    DbError::MissingObject {
        kind: entity.name.clone(),
        key: key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::Context;
    use crate::db::catalog::apply_catalog;
    use crate::db::DbError;
    use crate::model::record::Record;
    use crate::model::value::Value;
    use crate::schema::{EntityDescriptor, FieldDescriptor, FieldType, SchemaCatalog};
    use rusqlite::Connection;

    fn setup() -> (Connection, SchemaCatalog) {
        let catalog = SchemaCatalog {
            name: "Notes".to_string(),
            version: 1,
            entities: vec![EntityDescriptor::new(
                "Note",
                vec![
                    FieldDescriptor::new("id", FieldType::Text),
                    FieldDescriptor::new("text", FieldType::Text),
                ],
            )],
        };
        let mut conn = Connection::open_in_memory().unwrap();
        apply_catalog(&mut conn, &catalog).unwrap();
        (conn, catalog)
    }

    fn note(id: &str, text: &str) -> Record {
        Record::new().with("id", id).with("text", text)
    }

    fn count_rows(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM \"Note\";", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn save_applies_changes_in_order_and_clears_context() {
        let (mut conn, catalog) = setup();
        let mut context = Context::new();
        context.insert("Note", note("a", "first"));
        context.update("Note", Value::from("a"), note("b", "renamed"));
        context.insert("Note", note("c", "third"));
        context.delete("Note", Value::from("c"));

        assert_eq!(context.save(&mut conn, &catalog).unwrap(), 4);
        assert!(!context.has_changes());

        let (id, text): (String, String) = conn
            .query_row("SELECT id, text FROM \"Note\";", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!((id.as_str(), text.as_str()), ("b", "renamed"));
        assert_eq!(count_rows(&conn), 1);
    }

    #[test]
    fn failed_save_is_atomic_and_keeps_changes_pending() {
        let (mut conn, catalog) = setup();
        let mut context = Context::new();
        context.insert("Note", note("a", "first"));
        context.insert("Note", note("a", "duplicate"));

        let err = context.save(&mut conn, &catalog).unwrap_err();
        assert!(matches!(err, DbError::Sqlite(_)));
        assert_eq!(count_rows(&conn), 0);
        assert_eq!(context.pending_count(), 2);

        assert_eq!(context.rollback(), 2);
        assert_eq!(context.save(&mut conn, &catalog).unwrap(), 0);
    }

    #[test]
    fn update_of_missing_row_fails_with_missing_object() {
        let (mut conn, catalog) = setup();
        let mut context = Context::new();
        context.update("Note", Value::from("ghost"), note("ghost", "boo"));

        let err = context.save(&mut conn, &catalog).unwrap_err();
        assert!(matches!(
            err,
            DbError::MissingObject { ref kind, ref key } if kind == "Note" && key == "ghost"
        ));
    }

    #[test]
    fn unknown_kind_fails_save() {
        let (mut conn, catalog) = setup();
        let mut context = Context::new();
        context.delete("Task", Value::from("a"));

        let err = context.save(&mut conn, &catalog).unwrap_err();
        assert!(matches!(err, DbError::UnknownKind(kind) if kind == "Task"));
    }
}
