//! Entity data model shared by repository and storage layers.
//!
//! # Responsibility
//! - Represent field values independently of the storage engine.
//! - Define the typed `Entity` capability repositories are generic over.
//!
//! # Invariants
//! - A `Record` never knows its kind; kind comes from `Entity::KIND` or the
//!   caller of the runtime-keyed APIs.
//! - Timestamps are Unix epoch milliseconds.

pub mod entity;
pub mod record;
pub mod value;
