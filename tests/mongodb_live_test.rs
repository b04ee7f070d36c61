//! Tests against a real MongoDB server.
//!
//! Run with `TESTBENCH_TEST_MONGODB_URI=mongodb://localhost:27017 cargo test -- --ignored`.
//! Each test uses its own throwaway database and drops it afterwards.

use testbench_db::{
    wait_until_ready, CollectionRecord, MongoConfig, MongoConnection, NodeRecord, RetryConfig,
    SchemaBootstrapper, SchemaDefinition, SchemaStore, StoreError,
};

async fn connect(database: &str) -> MongoConnection {
    let uri = std::env::var("TESTBENCH_TEST_MONGODB_URI")
        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let config = MongoConfig {
        uri,
        database: database.to_string(),
        ..MongoConfig::default()
    };
    let connection = MongoConnection::connect(&config)
        .await
        .expect("failed to create client");
    wait_until_ready(&connection.store(), &RetryConfig::default())
        .await
        .expect("MongoDB should be reachable");
    connection
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn test_live_bootstrap_is_idempotent_and_enforces_node_uniqueness() {
    let database = format!("testbench-it-{}", uuid::Uuid::new_v4().simple());
    let connection = connect(&database).await;
    let bootstrapper = SchemaBootstrapper::new(
        connection.store(),
        SchemaDefinition::testbench().with_database(&database),
    )
    .expect("valid definition");

    let first = bootstrapper.apply().await.expect("first run");
    let second = bootstrapper.apply().await.expect("second run");
    assert_eq!(first.collections_created.len(), 7);
    assert_eq!(first.indexes_created.len(), 6);
    assert!(!second.changed_anything());
    assert!(bootstrapper.verify().await.unwrap().is_satisfied());

    let store = bootstrapper.store();
    let node = NodeRecord::new("10.0.0.1", "eval").to_document().unwrap();
    store
        .insert_document(NodeRecord::COLLECTION, node.clone())
        .await
        .expect("first insert should succeed");
    let err = store
        .insert_document(NodeRecord::COLLECTION, node)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey { .. }));

    connection
        .client()
        .database(&database)
        .drop()
        .await
        .expect("failed to drop test database");
    connection.close().await;
}
