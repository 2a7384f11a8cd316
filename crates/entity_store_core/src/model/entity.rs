//! Typed entity capability.

use super::record::{Record, RecordError};

/// A record type stored under one schema-declared kind.
///
/// `Default` is the freshly allocated instance handed to `create`'s
/// configure callback. Field names used by `to_record`/`from_record` must
/// match the kind's declaration in the catalog.
///
/// ```ignore
/// #[derive(Debug, Default)]
/// struct Note {
///     id: String,
///     text: String,
/// }
///
/// impl Entity for Note {
///     const KIND: &'static str = "Note";
///
///     fn to_record(&self) -> Record {
///         Record::new().with("id", &self.id).with("text", &self.text)
///     }
///
///     fn from_record(record: &Record) -> Result<Self, RecordError> {
///         Ok(Self {
///             id: record.text("id")?,
///             text: record.text("text")?,
///         })
///     }
/// }
/// ```
pub trait Entity: Default + Sized {
    /// Entity name in the schema catalog.
    const KIND: &'static str;

    fn to_record(&self) -> Record;

    fn from_record(record: &Record) -> Result<Self, RecordError>;
}
