use testbench_db::{InMemorySchemaStore, SchemaBootstrapper, SchemaDefinition, DEFAULT_DATABASE};

/// Bootstrapper over a fresh, empty in-memory database.
///
/// Each call creates a completely isolated store.
pub fn fresh_bootstrapper() -> SchemaBootstrapper<InMemorySchemaStore> {
    SchemaBootstrapper::new(
        InMemorySchemaStore::new(DEFAULT_DATABASE),
        SchemaDefinition::testbench(),
    )
    .expect("built-in schema should be valid")
}

/// Bootstrapper whose schema has already been applied once.
pub async fn bootstrapped() -> SchemaBootstrapper<InMemorySchemaStore> {
    let bootstrapper = fresh_bootstrapper();
    bootstrapper
        .apply()
        .await
        .expect("first bootstrap should succeed");
    bootstrapper
}
