//! Persistence handle owning the engine connection and working context.
//!
//! # Responsibility
//! - Load the schema catalog and open the store exactly once per handle.
//! - Expose the single working context and the commit operation.
//!
//! # Invariants
//! - A handle only exists with its catalog fully applied to storage.
//! - The handle is `Send` but not `Sync`: one logical thread owns it.

use super::context::Context;
use super::options::StoreOptions;
use super::OpenError;
use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::schema::SchemaCatalog;
use log::{debug, error};
use rusqlite::Connection;
use std::path::Path;
use std::time::Instant;

pub struct PersistenceStore {
    conn: Connection,
    catalog: SchemaCatalog,
    context: Context,
    options: StoreOptions,
}

impl PersistenceStore {
    /// Loads the configured catalog and opens the store it describes.
    ///
    /// # Errors
    /// - `OpenError::Schema` when the catalog cannot be located, parsed or validated.
    /// - `OpenError::Db` when the store cannot be opened or does not match the catalog.
    pub fn open(options: &StoreOptions) -> Result<Self, OpenError> {
        let catalog = SchemaCatalog::load(&options.schema_name, &options.schema_source)?;
        let conn = match options.store_path.as_deref() {
            Some(path) => open_db(path, &catalog, options.busy_timeout)?,
            None => open_db_in_memory(&catalog, options.busy_timeout)?,
        };

        Ok(Self {
            conn,
            catalog,
            context: Context::new(),
            options: options.clone(),
        })
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn store_path(&self) -> Option<&Path> {
        self.options.store_path.as_deref()
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Commits every pending change of the working context.
    ///
    /// On error nothing is written and the changes stay pending; call
    /// `context_mut().rollback()` to discard them.
    pub fn save(&mut self) -> DbResult<usize> {
        let started_at = Instant::now();
        let pending = self.context.pending_count();

        match self.context.save(&mut self.conn, &self.catalog) {
            Ok(applied) => {
                debug!(
                    "event=context_save module=store status=ok changes={} duration_ms={}",
                    applied,
                    started_at.elapsed().as_millis()
                );
                Ok(applied)
            }
            Err(err) => {
                error!(
                    "event=context_save module=store status=error changes={} duration_ms={} error={}",
                    pending,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}
