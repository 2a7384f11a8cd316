//! Schema catalog declaration and validation.
//!
//! # Responsibility
//! - Describe every entity kind the store knows about, schema-first.
//! - Reject catalogs whose names cannot be used as storage identifiers.
//!
//! # Invariants
//! - Entity and field names match `[A-Za-z_][A-Za-z0-9_]*`.
//! - Names are unique ignoring ASCII case, since storage identifiers are.
//! - Fields never shadow `rowid`; kinds never use the `sqlite_` table prefix.
//! - Every entity declares a non-optional identifier field.
//! - A catalog that failed `validate()` is never handed to the engine.
//!
//! # See also
//! - `schema::load` for catalog lookup by name.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod load;

pub use load::{SchemaSource, SCHEMA_FILE_EXTENSION};

const DEFAULT_IDENTIFIER_FIELD: &str = "id";
const DEFAULT_TIMESTAMP_FIELD: &str = "date";
const RESERVED_FIELD_NAMES: &[&str] = &["rowid", "oid", "_rowid_"];
const RESERVED_KIND_PREFIX: &str = "sqlite_";

static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern must compile")
});

pub type SchemaResult<T> = Result<T, SchemaError>;

/// Schema lookup, parse and validation failures.
#[derive(Debug)]
pub enum SchemaError {
    /// No catalog file exists at the resolved location.
    NotFound(PathBuf),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    /// Catalog parsed but breaks a declaration invariant.
    Invalid(String),
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "schema not found at `{}`", path.display()),
            Self::Io { path, source } => {
                write!(f, "failed to read schema `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "failed to parse schema: {err}"),
            Self::Invalid(message) => write!(f, "invalid schema: {message}"),
        }
    }
}

impl Error for SchemaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for SchemaError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Storage type of one declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Integer,
    Real,
    Bool,
    Uuid,
    /// Unix epoch milliseconds.
    Timestamp,
}

impl FieldType {
    /// Column affinity used when the kind's table is created.
    pub fn sql_type(self) -> &'static str {
        match self {
            Self::Text | Self::Uuid => "TEXT",
            Self::Integer | Self::Bool | Self::Timestamp => "INTEGER",
            Self::Real => "REAL",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Bool => "bool",
            Self::Uuid => "uuid",
            Self::Timestamp => "timestamp",
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared field of an entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Optional fields accept `Value::Null`; all others are `NOT NULL`.
    #[serde(default)]
    pub optional: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            optional: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// Declaration of one entity kind (one storage table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub name: String,
    /// Field used by fetch-by-id and to locate rows on update/delete.
    #[serde(default = "default_identifier_field")]
    pub identifier: String,
    /// Field used by fetch-by-date. May be absent from `fields`.
    #[serde(default = "default_timestamp_field")]
    pub timestamp: String,
    pub fields: Vec<FieldDescriptor>,
}

impl EntityDescriptor {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            identifier: default_identifier_field(),
            timestamp: default_timestamp_field(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn identifier_field(&self) -> Option<&FieldDescriptor> {
        self.field(&self.identifier)
    }

    pub fn timestamp_field(&self) -> Option<&FieldDescriptor> {
        self.field(&self.timestamp)
    }

    fn validate(&self) -> SchemaResult<()> {
        if !is_valid_identifier(&self.name) {
            return Err(SchemaError::Invalid(format!(
                "entity name `{}` is not a valid identifier",
                self.name
            )));
        }
        if self.name.to_ascii_lowercase().starts_with(RESERVED_KIND_PREFIX) {
            return Err(SchemaError::Invalid(format!(
                "entity name `{}` uses the reserved `{RESERVED_KIND_PREFIX}` prefix",
                self.name
            )));
        }
        if self.fields.is_empty() {
            return Err(SchemaError::Invalid(format!(
                "entity `{}` declares no fields",
                self.name
            )));
        }

        let mut seen = BTreeSet::new();
        for field in &self.fields {
            if !is_valid_identifier(&field.name) {
                return Err(SchemaError::Invalid(format!(
                    "field name `{}.{}` is not a valid identifier",
                    self.name, field.name
                )));
            }
            let folded = field.name.to_ascii_lowercase();
            if RESERVED_FIELD_NAMES.contains(&folded.as_str()) {
                return Err(SchemaError::Invalid(format!(
                    "field name `{}.{}` is reserved",
                    self.name, field.name
                )));
            }
            if !seen.insert(folded) {
                return Err(SchemaError::Invalid(format!(
                    "field `{}.{}` is declared twice",
                    self.name, field.name
                )));
            }
        }

        match self.identifier_field() {
            None => {
                return Err(SchemaError::Invalid(format!(
                    "entity `{}` has no identifier field `{}`",
                    self.name, self.identifier
                )));
            }
            Some(field) if field.optional => {
                return Err(SchemaError::Invalid(format!(
                    "identifier field `{}.{}` cannot be optional",
                    self.name, field.name
                )));
            }
            Some(_) => {}
        }

        if let Some(field) = self.timestamp_field() {
            if field.field_type != FieldType::Timestamp {
                return Err(SchemaError::Invalid(format!(
                    "timestamp field `{}.{}` must have type `timestamp`, got `{}`",
                    self.name, field.name, field.field_type
                )));
            }
        }

        Ok(())
    }
}

/// Complete set of entity kinds one store serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaCatalog {
    pub name: String,
    /// Mirrored into the store; a store written with another version is rejected.
    #[serde(default = "default_version")]
    pub version: u32,
    pub entities: Vec<EntityDescriptor>,
}

impl SchemaCatalog {
    /// Locates, parses and validates the catalog called `name`.
    pub fn load(name: &str, source: &SchemaSource) -> SchemaResult<Self> {
        load::load_catalog(name, source)
    }

    /// Parses and validates a catalog from JSON text.
    pub fn from_json_str(json: &str) -> SchemaResult<Self> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn entity(&self, kind: &str) -> Option<&EntityDescriptor> {
        self.entities.iter().find(|entity| entity.name == kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.entities.iter().map(|entity| entity.name.as_str())
    }

    /// Checks declaration-level catalog invariants.
    pub fn validate(&self) -> SchemaResult<()> {
        if !is_valid_identifier(&self.name) {
            return Err(SchemaError::Invalid(format!(
                "catalog name `{}` is not a valid identifier",
                self.name
            )));
        }
        if self.version == 0 {
            return Err(SchemaError::Invalid(
                "catalog version must be greater than zero".to_string(),
            ));
        }
        if self.entities.is_empty() {
            return Err(SchemaError::Invalid(format!(
                "catalog `{}` declares no entities",
                self.name
            )));
        }

        let mut seen = BTreeSet::new();
        for entity in &self.entities {
            entity.validate()?;
            if !seen.insert(entity.name.to_ascii_lowercase()) {
                return Err(SchemaError::Invalid(format!(
                    "entity `{}` is declared twice",
                    entity.name
                )));
            }
        }
        Ok(())
    }
}

pub(crate) fn is_valid_identifier(value: &str) -> bool {
    IDENTIFIER_PATTERN.is_match(value)
}

fn default_identifier_field() -> String {
    DEFAULT_IDENTIFIER_FIELD.to_string()
}

fn default_timestamp_field() -> String {
    DEFAULT_TIMESTAMP_FIELD.to_string()
}

fn default_version() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::{EntityDescriptor, FieldDescriptor, FieldType, SchemaCatalog, SchemaError};

    const NOTES_JSON: &str = r#"{
        "name": "Notes",
        "entities": [
            {
                "name": "Note",
                "fields": [
                    { "name": "id", "type": "text" },
                    { "name": "text", "type": "text" },
                    { "name": "date", "type": "timestamp", "optional": true }
                ]
            }
        ]
    }"#;

    fn note_catalog() -> SchemaCatalog {
        SchemaCatalog {
            name: "Notes".to_string(),
            version: 1,
            entities: vec![EntityDescriptor::new(
                "Note",
                vec![
                    FieldDescriptor::new("id", FieldType::Text),
                    FieldDescriptor::new("text", FieldType::Text),
                ],
            )],
        }
    }

    #[test]
    fn from_json_str_applies_defaults() {
        let catalog = SchemaCatalog::from_json_str(NOTES_JSON).expect("catalog should parse");
        assert_eq!(catalog.version, 1);

        let note = catalog.entity("Note").expect("Note kind should exist");
        assert_eq!(note.identifier, "id");
        assert_eq!(note.timestamp, "date");
        assert!(note.field("date").expect("date field").optional);
        assert!(!note.field("text").expect("text field").optional);
    }

    #[test]
    fn validate_rejects_unsafe_names() {
        let mut catalog = note_catalog();
        catalog.entities[0].fields[1].name = "text; DROP TABLE".to_string();

        let err = catalog.validate().expect_err("unsafe field name must fail");
        assert!(matches!(err, SchemaError::Invalid(message) if message.contains("identifier")));
    }

    #[test]
    fn validate_rejects_missing_or_optional_identifier() {
        let mut missing = note_catalog();
        missing.entities[0].identifier = "uuid".to_string();
        assert!(missing.validate().is_err());

        let mut optional = note_catalog();
        optional.entities[0].fields[0].optional = true;
        let err = optional.validate().expect_err("optional identifier must fail");
        assert!(err.to_string().contains("cannot be optional"));
    }

    #[test]
    fn validate_rejects_duplicates() {
        let mut fields = note_catalog();
        fields.entities[0]
            .fields
            .push(FieldDescriptor::new("text", FieldType::Integer));
        assert!(fields.validate().is_err());

        let mut kinds = note_catalog();
        let copy = kinds.entities[0].clone();
        kinds.entities.push(copy);
        let err = kinds.validate().expect_err("duplicate kind must fail");
        assert!(err.to_string().contains("declared twice"));
    }

    #[test]
    fn validate_rejects_duplicates_differing_only_in_case() {
        let mut fields = note_catalog();
        fields.entities[0]
            .fields
            .push(FieldDescriptor::new("ID", FieldType::Text));
        let err = fields.validate().expect_err("`id` and `ID` must collide");
        assert!(err.to_string().contains("`Note.ID` is declared twice"));

        let mut kinds = note_catalog();
        let mut lower = kinds.entities[0].clone();
        lower.name = "note".to_string();
        kinds.entities.push(lower);
        let err = kinds.validate().expect_err("`Note` and `note` must collide");
        assert!(err.to_string().contains("`note` is declared twice"));
    }

    #[test]
    fn validate_rejects_rowid_aliases_as_field_names() {
        for name in ["rowid", "OID", "_rowid_"] {
            let mut catalog = note_catalog();
            catalog.entities[0]
                .fields
                .push(FieldDescriptor::new(name, FieldType::Integer));

            let err = catalog.validate().expect_err("rowid alias must fail");
            assert!(err.to_string().contains("is reserved"), "{name}: {err}");
        }
    }

    #[test]
    fn validate_rejects_sqlite_table_prefix_for_kinds() {
        for name in ["sqlite_master", "SQLite_Notes"] {
            let mut catalog = note_catalog();
            catalog.entities[0].name = name.to_string();

            let err = catalog.validate().expect_err("sqlite_ prefix must fail");
            assert!(err.to_string().contains("reserved `sqlite_` prefix"), "{name}: {err}");
        }
    }

    #[test]
    fn validate_rejects_non_timestamp_date_field() {
        let mut catalog = note_catalog();
        catalog.entities[0]
            .fields
            .push(FieldDescriptor::new("date", FieldType::Text));

        let err = catalog.validate().expect_err("text date field must fail");
        assert!(err.to_string().contains("must have type `timestamp`"));
    }

    #[test]
    fn from_json_str_rejects_unknown_field_type() {
        let json = NOTES_JSON.replace("\"timestamp\"", "\"datetime\"");
        let err = SchemaCatalog::from_json_str(&json).expect_err("unknown type must fail");
        assert!(matches!(err, SchemaError::Parse(_)));
    }
}
