use async_trait::async_trait;
use mongodb::bson::Document;
use serde::Serialize;

use super::errors::StoreError;
use crate::domain::models::{CollectionRecord, IndexSpec};

/// Result of asking the store to create a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionOutcome {
    Created,
    AlreadyExists,
}

/// An index as reported by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExistingIndex {
    pub name: String,
    pub keys: Document,
    pub unique: bool,
}

impl ExistingIndex {
    pub fn from_spec(spec: &IndexSpec) -> Self {
        Self {
            name: spec.name(),
            keys: spec.keys(),
            unique: spec.unique,
        }
    }

    /// Same keys in the same order, same uniqueness.
    pub fn satisfies(&self, spec: &IndexSpec) -> bool {
        self.unique == spec.unique && spec.matches_keys(&self.keys)
    }
}

/// Port to the document database that holds the testbench collections.
///
/// Implementations are bound to one database. Collection and index creation
/// must be idempotent: re-creating something that already exists with the
/// same definition is not an error.
#[async_trait]
pub trait SchemaStore: Send + Sync {
    /// Name of the database this store is bound to
    fn database_name(&self) -> &str;

    /// Check that the server answers
    async fn ping(&self) -> Result<(), StoreError>;

    /// Names of the collections that currently exist
    async fn list_collections(&self) -> Result<Vec<String>, StoreError>;

    /// Create a collection unless it already exists
    async fn create_collection(&self, name: &str) -> Result<CollectionOutcome, StoreError>;

    /// Indexes declared on `collection`, excluding the implicit `_id_` index.
    ///
    /// A missing collection has no indexes.
    async fn list_indexes(&self, collection: &str) -> Result<Vec<ExistingIndex>, StoreError>;

    /// Create `index` under its default name and return that name
    ///
    /// # Errors
    /// - `IndexConflict` if an index with the same name or keys but a
    ///   different definition exists
    /// - `DuplicateKey` if a unique index cannot be built over existing data
    async fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<String, StoreError>;

    /// Insert one document
    ///
    /// # Errors
    /// - `DuplicateKey` if the document violates a unique index
    async fn insert_document(&self, collection: &str, document: Document)
        -> Result<(), StoreError>;
}

/// Serialize `record` and insert it into its own collection.
///
/// # Errors
/// - `Serialization` if the record cannot be encoded as BSON
/// - any error from [`SchemaStore::insert_document`]
pub async fn insert_record<S, R>(store: &S, record: &R) -> Result<(), StoreError>
where
    S: SchemaStore + ?Sized,
    R: CollectionRecord + Sync,
{
    store
        .insert_document(R::COLLECTION, record.to_document()?)
        .await
}
