//! Catalog lookup by name.

use super::{SchemaCatalog, SchemaError, SchemaResult};
use log::{debug, error};
use std::path::{Path, PathBuf};

/// File extension appended to the catalog name in directory lookups.
pub const SCHEMA_FILE_EXTENSION: &str = "schema.json";

/// Where a named catalog is looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// Reads `<dir>/<name>.schema.json`.
    Directory(PathBuf),
    /// Catalog JSON compiled into the binary, e.g. via `include_str!`.
    Embedded(&'static str),
}

impl SchemaSource {
    pub fn directory(path: impl AsRef<Path>) -> Self {
        Self::Directory(path.as_ref().to_path_buf())
    }

    fn describe(&self) -> String {
        match self {
            Self::Directory(dir) => dir.display().to_string(),
            Self::Embedded(_) => "embedded".to_string(),
        }
    }
}

pub(super) fn load_catalog(name: &str, source: &SchemaSource) -> SchemaResult<SchemaCatalog> {
    let result = match source {
        SchemaSource::Directory(dir) => read_catalog_file(&dir.join(schema_file_name(name))),
        SchemaSource::Embedded(json) => SchemaCatalog::from_json_str(json),
    }
    .and_then(|catalog| ensure_name_matches(name, catalog));

    match &result {
        Ok(catalog) => debug!(
            "event=schema_load module=schema status=ok name={} source={} entities={}",
            name,
            source.describe(),
            catalog.entities.len()
        ),
        Err(err) => error!(
            "event=schema_load module=schema status=error name={} source={} error={}",
            name,
            source.describe(),
            err
        ),
    }
    result
}

fn schema_file_name(name: &str) -> String {
    format!("{name}.{SCHEMA_FILE_EXTENSION}")
}

fn read_catalog_file(path: &Path) -> SchemaResult<SchemaCatalog> {
    if !path.is_file() {
        return Err(SchemaError::NotFound(path.to_path_buf()));
    }
    let json = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    SchemaCatalog::from_json_str(&json)
}

fn ensure_name_matches(name: &str, catalog: SchemaCatalog) -> SchemaResult<SchemaCatalog> {
    if catalog.name != name {
        return Err(SchemaError::Invalid(format!(
            "catalog declares name `{}` but was loaded as `{name}`",
            catalog.name
        )));
    }
    Ok(catalog)
}
