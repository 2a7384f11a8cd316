//! Catalog materialization on a SQLite connection.
//!
//! # Responsibility
//! - Create one table per declared entity kind.
//! - Refuse stores that were written for a different catalog.
//!
//! # Invariants
//! - Tables are created atomically: all kinds or none.
//! - A non-zero `PRAGMA user_version` must equal the catalog version.
//! - Existing tables must carry every declared column.

use super::sql::quote_ident;
use super::{DbError, DbResult};
use crate::schema::{EntityDescriptor, SchemaCatalog};
use rusqlite::{Connection, OptionalExtension};

/// Returns the catalog version recorded in the store (0 for a fresh store).
pub fn stored_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Creates missing entity tables and records the catalog version.
pub fn apply_catalog(conn: &mut Connection, catalog: &SchemaCatalog) -> DbResult<()> {
    let stored = stored_version(conn)?;
    if stored != 0 && stored != catalog.version {
        return Err(DbError::SchemaVersionMismatch {
            stored,
            declared: catalog.version,
        });
    }

    let tx = conn.transaction()?;
    for entity in &catalog.entities {
        if table_exists(&tx, &entity.name)? {
            ensure_columns(&tx, entity)?;
        } else {
            tx.execute_batch(&create_table_sql(entity))?;
        }
    }
    if stored == 0 {
        tx.execute_batch(&format!("PRAGMA user_version = {};", catalog.version))?;
    }
    tx.commit()?;

    Ok(())
}

fn create_table_sql(entity: &EntityDescriptor) -> String {
    let columns = entity
        .fields
        .iter()
        .map(|field| {
            let mut column = format!("{} {}", quote_ident(&field.name), field.field_type.sql_type());
            if !field.optional {
                column.push_str(" NOT NULL");
            }
            if field.name == entity.identifier {
                column.push_str(" UNIQUE");
            }
            column
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!("CREATE TABLE {} ({columns});", quote_ident(&entity.name))
}

fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            [table],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn ensure_columns(conn: &Connection, entity: &EntityDescriptor) -> DbResult<()> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let existing = stmt
        .query_map([entity.name.as_str()], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    for field in &entity.fields {
        if !existing.iter().any(|column| column == &field.name) {
            return Err(DbError::MissingRequiredColumn {
                table: entity.name.clone(),
                column: field.name.clone(),
            });
        }
    }
    Ok(())
}
