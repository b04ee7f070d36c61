//! In-memory schema store.
//!
//! Mirrors the MongoDB behaviour the bootstrap depends on: implicit
//! collection creation, idempotent index creation, conflicting index
//! definitions and unique-index enforcement on insert.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use mongodb::bson::{Bson, Document};

use crate::domain::models::{lookup_path, IndexSpec};
use crate::domain::ports::{CollectionOutcome, ExistingIndex, SchemaStore, StoreError};

#[derive(Debug, Default)]
struct MemoryCollection {
    indexes: Vec<ExistingIndex>,
    documents: Vec<Document>,
}

impl MemoryCollection {
    fn unique_key(index: &ExistingIndex, document: &Document) -> Vec<Bson> {
        index
            .keys
            .keys()
            .map(|path| lookup_path(document, path).cloned().unwrap_or(Bson::Null))
            .collect()
    }

    /// First unique index that `document` would violate.
    fn violated_index(&self, document: &Document) -> Option<&ExistingIndex> {
        self.indexes.iter().filter(|i| i.unique).find(|index| {
            let key = Self::unique_key(index, document);
            self.documents
                .iter()
                .any(|existing| Self::unique_key(index, existing) == key)
        })
    }
}

/// Schema store held entirely in process memory.
#[derive(Debug)]
pub struct InMemorySchemaStore {
    database: String,
    collections: Mutex<HashMap<String, MemoryCollection>>,
    unavailable_pings: AtomicU32,
}

impl InMemorySchemaStore {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collections: Mutex::new(HashMap::new()),
            unavailable_pings: AtomicU32::new(0),
        }
    }

    /// Make the next `count` pings fail with a connection error.
    #[must_use]
    pub fn with_unavailable_pings(self, count: u32) -> Self {
        self.unavailable_pings.store(count, Ordering::SeqCst);
        self
    }

    /// Documents currently stored in `collection`.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.lock()
            .get(collection)
            .map(|c| c.documents.clone())
            .unwrap_or_default()
    }

    /// Declare an index directly, bypassing the conflict checks.
    ///
    /// Lets tests reproduce a database that drifted from the definition.
    pub fn force_index(&self, collection: &str, index: ExistingIndex) {
        let mut collections = self.lock();
        let entry = collections.entry(collection.to_string()).or_default();
        entry.indexes.retain(|i| i.name != index.name);
        entry.indexes.push(index);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, MemoryCollection>> {
        // A poisoned lock only means another test thread panicked mid-write.
        self.collections
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl SchemaStore for InMemorySchemaStore {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let remaining = self.unavailable_pings.load(Ordering::SeqCst);
        if remaining > 0 {
            self.unavailable_pings.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Connection(
                "server selection timed out".to_string(),
            ));
        }
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn create_collection(&self, name: &str) -> Result<CollectionOutcome, StoreError> {
        let mut collections = self.lock();
        if collections.contains_key(name) {
            return Ok(CollectionOutcome::AlreadyExists);
        }
        collections.insert(name.to_string(), MemoryCollection::default());
        Ok(CollectionOutcome::Created)
    }

    async fn list_indexes(&self, collection: &str) -> Result<Vec<ExistingIndex>, StoreError> {
        Ok(self
            .lock()
            .get(collection)
            .map(|c| c.indexes.clone())
            .unwrap_or_default())
    }

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<String, StoreError> {
        let name = index.name();
        let mut collections = self.lock();
        let entry = collections.entry(collection.to_string()).or_default();

        if let Some(existing) = entry.indexes.iter().find(|i| i.name == name) {
            if existing.satisfies(index) {
                return Ok(name);
            }
            return Err(StoreError::IndexConflict {
                collection: collection.to_string(),
                index: name,
                message: "an index with the same name but different options exists".to_string(),
            });
        }

        if let Some(existing) = entry.indexes.iter().find(|i| index.matches_keys(&i.keys)) {
            return Err(StoreError::IndexConflict {
                collection: collection.to_string(),
                index: name,
                message: format!(
                    "index already exists with a different name: {}",
                    existing.name
                ),
            });
        }

        let candidate = ExistingIndex::from_spec(index);
        if candidate.unique {
            let mut seen = Vec::with_capacity(entry.documents.len());
            for document in &entry.documents {
                let key = MemoryCollection::unique_key(&candidate, document);
                if seen.contains(&key) {
                    return Err(StoreError::DuplicateKey {
                        collection: collection.to_string(),
                        message: format!("cannot build unique index {name} over existing documents"),
                    });
                }
                seen.push(key);
            }
        }

        entry.indexes.push(candidate);
        Ok(name)
    }

    async fn insert_document(
        &self,
        collection: &str,
        document: Document,
    ) -> Result<(), StoreError> {
        let mut collections = self.lock();
        let entry = collections.entry(collection.to_string()).or_default();

        if let Some(index) = entry.violated_index(&document) {
            return Err(StoreError::DuplicateKey {
                collection: collection.to_string(),
                message: format!("E11000 duplicate key error index: {}", index.name),
            });
        }

        entry.documents.push(document);
        Ok(())
    }
}
