//! Storage-backed entity repository.
//!
//! # Responsibility
//! - Own the persistence handle behind a lazy, idempotent `setup`.
//! - Implement the typed contracts on top of runtime-keyed record APIs.
//!
//! # Invariants
//! - The handle is opened at most once per `EntityStorage`.
//! - A catalog that cannot be loaded aborts setup; no operation can run without it.

use super::{EntityFetcher, EntityStore, RepoError, RepoResult};
use crate::db::sql::decode_row;
use crate::fetch::query::build_select;
use crate::fetch::FetchSpec;
use crate::model::entity::Entity;
use crate::model::record::Record;
use crate::model::value::Value;
use crate::schema::EntityDescriptor;
use crate::store::{PersistenceStore, StoreOptions};
use log::{debug, error, info};
use rusqlite::params_from_iter;
use std::time::Instant;

/// Generic repository over every kind declared in the store's catalog.
#[derive(Default)]
pub struct EntityStorage {
    store: Option<PersistenceStore>,
}

impl EntityStorage {
    /// Creates storage that still needs `setup`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already opened handle.
    pub fn with_store(store: PersistenceStore) -> Self {
        Self { store: Some(store) }
    }

    /// Opens the store described by `options`. Later calls are no-ops.
    ///
    /// # Panics
    /// Panics when the catalog cannot be located, parsed or applied to the
    /// store. Callers that need to inspect the failure use
    /// `PersistenceStore::open` directly.
    pub fn setup(&mut self, options: &StoreOptions) {
        if self.store.is_some() {
            debug!(
                "event=storage_setup module=repo status=skipped schema={}",
                options.schema_name
            );
            return;
        }

        match PersistenceStore::open(options) {
            Ok(store) => {
                info!(
                    "event=storage_setup module=repo status=ok schema={} in_memory={}",
                    options.schema_name,
                    options.is_in_memory()
                );
                self.store = Some(store);
            }
            Err(err) => {
                error!(
                    "event=storage_setup module=repo status=fatal schema={} error={}",
                    options.schema_name, err
                );
                panic!(
                    "failed to load persistent store `{}`: {err}",
                    options.schema_name
                );
            }
        }
    }

    pub fn is_setup(&self) -> bool {
        self.store.is_some()
    }

    pub fn store(&self) -> RepoResult<&PersistenceStore> {
        self.store.as_ref().ok_or(RepoError::NotSetUp)
    }

    /// Discards changes left pending by a failed commit.
    pub fn rollback(&mut self) -> RepoResult<usize> {
        let discarded = self.store_mut()?.context_mut().rollback();
        if discarded > 0 {
            info!(
                "event=context_rollback module=repo status=ok discarded={}",
                discarded
            );
        }
        Ok(discarded)
    }

    /// Validates and inserts one record of `kind`, then commits.
    pub fn create_record(&mut self, kind: &str, record: Record) -> RepoResult<Record> {
        let store = self.store_mut()?;
        let record = validate_record(entity_of(store, kind)?, record)?;
        store.context_mut().insert(kind, record.clone());
        commit(store)?;
        Ok(record)
    }

    /// Replaces the stored record whose identifier equals `key`, then commits.
    pub fn update_record(&mut self, kind: &str, key: Value, record: Record) -> RepoResult<Record> {
        let store = self.store_mut()?;
        let entity = entity_of(store, kind)?;
        let key = validate_key(entity, key)?;
        let record = validate_record(entity, record)?;
        store.context_mut().update(kind, key, record.clone());
        commit(store)?;
        Ok(record)
    }

    /// Removes the stored record whose identifier equals `key`, then commits.
    pub fn delete_record(&mut self, kind: &str, key: Value) -> RepoResult<()> {
        let store = self.store_mut()?;
        let key = validate_key(entity_of(store, kind)?, key)?;
        store.context_mut().delete(kind, key);
        commit(store)
    }

    /// Runs `spec` against the committed records of `kind`.
    pub fn fetch_records(&self, kind: &str, spec: &FetchSpec) -> RepoResult<Vec<Record>> {
        let started_at = Instant::now();
        let store = self.store()?;
        let entity = entity_of(store, kind)?;
        let query = build_select(entity, spec).map_err(|source| RepoError::InvalidFilter {
            kind: kind.to_string(),
            source,
        })?;

        let mut stmt = store
            .connection()
            .prepare_cached(&query.sql)
            .map_err(|err| RepoError::Query(err.into()))?;
        let mut rows = stmt
            .query(params_from_iter(query.binds))
            .map_err(|err| RepoError::Query(err.into()))?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().map_err(|err| RepoError::Query(err.into()))? {
            records.push(decode_row(entity, row).map_err(RepoError::Query)?);
        }

        debug!(
            "event=entity_fetch module=repo status=ok kind={} rows={} duration_ms={}",
            kind,
            records.len(),
            started_at.elapsed().as_millis()
        );
        Ok(records)
    }

    fn store_mut(&mut self) -> RepoResult<&mut PersistenceStore> {
        self.store.as_mut().ok_or(RepoError::NotSetUp)
    }

    fn identifier_of<E: Entity>(&self, entity: &E) -> RepoResult<Value> {
        let descriptor = entity_of(self.store()?, E::KIND)?;
        Ok(entity
            .to_record()
            .get(&descriptor.identifier)
            .cloned()
            .unwrap_or(Value::Null))
    }
}

impl EntityStore for EntityStorage {
    fn create<E, F>(&mut self, configure: F) -> RepoResult<E>
    where
        E: Entity,
        F: FnOnce(&mut E),
    {
        let mut entity = E::default();
        configure(&mut entity);
        self.create_record(E::KIND, entity.to_record())?;
        Ok(entity)
    }

    fn update<E, F>(&mut self, entity: &mut E, configure: F) -> RepoResult<()>
    where
        E: Entity,
        F: FnOnce(&mut E),
    {
        let key = self.identifier_of(entity)?;
        configure(entity);
        self.update_record(E::KIND, key, entity.to_record())?;
        Ok(())
    }

    fn delete<E: Entity>(&mut self, entity: &E) -> RepoResult<()> {
        let key = self.identifier_of(entity)?;
        self.delete_record(E::KIND, key)
    }
}

impl EntityFetcher for EntityStorage {
    fn fetch<E: Entity>(&self, spec: &FetchSpec) -> RepoResult<Vec<E>> {
        self.fetch_records(E::KIND, spec)?
            .iter()
            .map(|record| {
                E::from_record(record).map_err(|source| RepoError::Record {
                    kind: E::KIND.to_string(),
                    source,
                })
            })
            .collect()
    }
}

fn entity_of<'a>(store: &'a PersistenceStore, kind: &str) -> RepoResult<&'a EntityDescriptor> {
    store
        .catalog()
        .entity(kind)
        .ok_or_else(|| RepoError::UnknownKind(kind.to_string()))
}

fn commit(store: &mut PersistenceStore) -> RepoResult<()> {
    store.save().map(|_| ()).map_err(RepoError::Commit)
}

/// Checks `record` against the declaration and returns it in canonical value shapes.
fn validate_record(entity: &EntityDescriptor, record: Record) -> RepoResult<Record> {
    let invalid = |message: String| RepoError::Validation {
        kind: entity.name.clone(),
        message,
    };

    for (name, _) in record.iter() {
        if entity.field(name).is_none() {
            return Err(invalid(format!("unknown field `{name}`")));
        }
    }

    let mut normalized = Record::new();
    for field in &entity.fields {
        let value = record.get(&field.name).cloned().unwrap_or(Value::Null);
        let actual = value.type_name();
        let value = value.coerce_to(field.field_type).ok_or_else(|| {
            invalid(format!(
                "field `{}` expects {}, got {actual}",
                field.name, field.field_type
            ))
        })?;
        if value.is_null() && !field.optional {
            return Err(invalid(format!("field `{}` requires a value", field.name)));
        }
        if let Value::Real(number) = &value {
            if !number.is_finite() {
                return Err(invalid(format!(
                    "field `{}` must be a finite number, got {number}",
                    field.name
                )));
            }
        }
        normalized.set(field.name.clone(), value);
    }
    Ok(normalized)
}

fn validate_key(entity: &EntityDescriptor, key: Value) -> RepoResult<Value> {
    let field_type = entity
        .identifier_field()
        .map(|field| field.field_type)
        .ok_or_else(|| RepoError::UnknownKind(entity.name.clone()))?;
    let actual = key.type_name();

    match key.coerce_to(field_type) {
        Some(Value::Real(number)) if !number.is_finite() => Err(RepoError::Validation {
            kind: entity.name.clone(),
            message: format!(
                "identifier `{}` must be a finite number, got {number}",
                entity.identifier
            ),
        }),
        Some(Value::Null) | None => Err(RepoError::Validation {
            kind: entity.name.clone(),
            message: format!(
                "identifier `{}` expects {field_type}, got {actual}",
                entity.identifier
            ),
        }),
        Some(key) => Ok(key),
    }
}
