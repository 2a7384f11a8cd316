//! Connection bootstrap for entity stores.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by the store.
//! - Apply the schema catalog before returning a usable connection.
//!
//! # Invariants
//! - Returned connections wait up to the configured busy timeout on locks.
//! - Returned connections have every catalog table in place.

use super::catalog::apply_catalog;
use super::{DbError, DbResult};
use crate::schema::SchemaCatalog;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Busy timeout applied when the caller does not configure one.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) a SQLite store file and applies `catalog`.
///
/// # Side effects
/// - Creates the file when it does not exist.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(
    path: impl AsRef<Path>,
    catalog: &SchemaCatalog,
    busy_timeout: Duration,
) -> DbResult<Connection> {
    let path = path.as_ref();
    open_with("file", catalog, busy_timeout, || Connection::open(path))
}

/// Opens a private in-memory store and applies `catalog`.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_in_memory(catalog: &SchemaCatalog, busy_timeout: Duration) -> DbResult<Connection> {
    open_with("memory", catalog, busy_timeout, Connection::open_in_memory)
}

fn open_with(
    mode: &'static str,
    catalog: &SchemaCatalog,
    busy_timeout: Duration,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!(
        "event=db_open module=db status=start mode={} catalog={}",
        mode, catalog.name
    );

    let mut conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(DbError::Sqlite(err));
        }
    };

    match bootstrap_connection(&mut conn, catalog, busy_timeout) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} catalog={} version={} duration_ms={}",
                mode,
                catalog.name,
                catalog.version,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(
    conn: &mut Connection,
    catalog: &SchemaCatalog,
    busy_timeout: Duration,
) -> DbResult<()> {
    conn.busy_timeout(busy_timeout)?;
    apply_catalog(conn, catalog)?;
    Ok(())
}
