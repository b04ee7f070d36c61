use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Database, IndexModel};

use super::errors::{
    classify, create_collection_error, index_error, server_code, write_error,
    NAMESPACE_NOT_FOUND,
};
use crate::domain::models::IndexSpec;
use crate::domain::ports::{CollectionOutcome, ExistingIndex, SchemaStore, StoreError};

const ID_INDEX: &str = "_id_";

/// [`SchemaStore`] backed by a MongoDB database.
#[derive(Clone)]
pub struct MongoSchemaStore {
    database: Database,
}

impl MongoSchemaStore {
    pub const fn new(database: Database) -> Self {
        Self { database }
    }

    fn collection(&self, name: &str) -> mongodb::Collection<Document> {
        self.database.collection::<Document>(name)
    }
}

fn index_model(index: &IndexSpec) -> IndexModel {
    IndexModel::builder()
        .keys(index.keys())
        .options(
            IndexOptions::builder()
                .name(index.name())
                .unique(index.unique.then_some(true))
                .build(),
        )
        .build()
}

fn existing_index(model: IndexModel) -> Option<ExistingIndex> {
    let options = model.options.unwrap_or_default();
    let name = options.name?;
    Some(ExistingIndex {
        name,
        keys: model.keys,
        unique: options.unique.unwrap_or(false),
    })
}

#[async_trait]
impl SchemaStore for MongoSchemaStore {
    fn database_name(&self) -> &str {
        self.database.name()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        self.database.list_collection_names().await.map_err(classify)
    }

    async fn create_collection(&self, name: &str) -> Result<CollectionOutcome, StoreError> {
        match self.database.create_collection(name).await {
            Ok(()) => Ok(CollectionOutcome::Created),
            Err(err) => create_collection_error(err),
        }
    }

    async fn list_indexes(&self, collection: &str) -> Result<Vec<ExistingIndex>, StoreError> {
        let cursor = match self.collection(collection).list_indexes().await {
            Ok(cursor) => cursor,
            Err(err) if server_code(&err) == Some(NAMESPACE_NOT_FOUND) => return Ok(Vec::new()),
            Err(err) => return Err(classify(err)),
        };

        let models: Vec<IndexModel> = cursor.try_collect().await.map_err(classify)?;
        Ok(models
            .into_iter()
            .filter_map(existing_index)
            .filter(|index| index.name != ID_INDEX)
            .collect())
    }

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<String, StoreError> {
        let name = index.name();
        let created = self
            .collection(collection)
            .create_index(index_model(index))
            .await
            .map_err(|err| index_error(err, collection, &name))?;
        Ok(created.index_name)
    }

    async fn insert_document(
        &self,
        collection: &str,
        document: Document,
    ) -> Result<(), StoreError> {
        self.collection(collection)
            .insert_one(document)
            .await
            .map_err(|err| write_error(err, collection))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_model_carries_name_and_uniqueness() {
        let spec = IndexSpec::ascending(["address", "service"]).unique();
        let model = index_model(&spec);
        let options = model.options.expect("options should be set");

        assert_eq!(model.keys, doc! { "address": 1, "service": 1 });
        assert_eq!(options.name.as_deref(), Some("address_1_service_1"));
        assert_eq!(options.unique, Some(true));
    }

    #[test]
    fn test_non_unique_index_leaves_unique_unset() {
        let model = index_model(&IndexSpec::ascending(["hash"]));
        assert_eq!(model.options.and_then(|o| o.unique), None);
    }

    #[test]
    fn test_existing_index_requires_a_name() {
        let model = IndexModel::builder().keys(doc! { "hash": 1 }).build();
        assert!(existing_index(model).is_none());
    }
}
