//! Port trait definitions (Hexagonal Architecture)
//!
//! - `SchemaStore`: collection and index operations against the document database
//!
//! The bootstrap services only talk to the database through this trait, so
//! they run unchanged against MongoDB or the in-memory adapter.

pub mod errors;
pub mod schema_store;

pub use errors::StoreError;
pub use schema_store::{insert_record, CollectionOutcome, ExistingIndex, SchemaStore};
