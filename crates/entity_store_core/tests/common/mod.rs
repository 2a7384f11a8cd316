#![allow(dead_code)]

use entity_store_core::{
    Entity, EntityStorage, Record, RecordError, SchemaSource, StoreOptions, Value,
};
use uuid::Uuid;

pub const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");
pub const NOTES_SCHEMA: &str = "Notes";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Note {
    pub id: String,
    pub text: String,
    pub date: Option<i64>,
}

impl Entity for Note {
    const KIND: &'static str = "Note";

    fn to_record(&self) -> Record {
        Record::new()
            .with("id", &self.id)
            .with("text", &self.text)
            .with("date", self.date.map(Value::Timestamp))
    }

    fn from_record(record: &Record) -> Result<Self, RecordError> {
        Ok(Self {
            id: record.text("id")?,
            text: record.text("text")?,
            date: record.opt_timestamp("date")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Task {
    pub uuid: Uuid,
    pub title: String,
    pub done: bool,
    pub estimate: Option<f64>,
    pub due: Option<i64>,
}

impl Entity for Task {
    const KIND: &'static str = "Task";

    fn to_record(&self) -> Record {
        Record::new()
            .with("uuid", self.uuid)
            .with("title", &self.title)
            .with("done", self.done)
            .with("estimate", self.estimate)
            .with("due", self.due.map(Value::Timestamp))
    }

    fn from_record(record: &Record) -> Result<Self, RecordError> {
        Ok(Self {
            uuid: record.uuid("uuid")?,
            title: record.text("title")?,
            done: record.boolean("done")?,
            estimate: record.opt_real("estimate")?,
            due: record.opt_timestamp("due")?,
        })
    }
}

pub fn notes_options() -> StoreOptions {
    StoreOptions::new(NOTES_SCHEMA, SchemaSource::directory(FIXTURES_DIR))
}

/// In-memory storage backed by the `Notes` fixture catalog.
pub fn open_storage() -> EntityStorage {
    let mut storage = EntityStorage::new();
    storage.setup(&notes_options());
    storage
}

pub fn note<'a>(id: &'a str, text: &'a str) -> impl FnOnce(&mut Note) + 'a {
    move |entity: &mut Note| {
        entity.id = id.to_string();
        entity.text = text.to_string();
    }
}
