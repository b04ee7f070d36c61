//! testbench-db - schema bootstrap for the ML evaluation testbench
//!
//! Creates the collections and indexes of the `pocket-ml-testbench` MongoDB
//! database that the evaluation pipeline (tokenizers, tasks, instances,
//! prompts, responses, nodes, results) reads and writes. Re-running is safe.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): schema definition, document models, store port
//! - **Service Layer** (`services`): plan / apply / verify, readiness wait
//! - **Adapters** (`adapters`): MongoDB and in-memory stores
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use testbench_db::{InMemorySchemaStore, SchemaBootstrapper, SchemaDefinition, DEFAULT_DATABASE};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = InMemorySchemaStore::new(DEFAULT_DATABASE);
//!     let report = SchemaBootstrapper::new(store, SchemaDefinition::testbench())?
//!         .apply()
//!         .await?;
//!     assert_eq!(report.collections_created.len(), 7);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::memory::InMemorySchemaStore;
pub use adapters::mongo::{MongoConnection, MongoSchemaStore};
pub use domain::models::{
    CollectionRecord, CollectionSpec, Config, IndexField, IndexSpec, LoggingConfig, MongoConfig,
    NodeRecord, RetryConfig, SchemaDefinition, SortOrder, DEFAULT_DATABASE,
};
pub use domain::ports::{insert_record, CollectionOutcome, ExistingIndex, SchemaStore, StoreError};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    wait_until_ready, BootstrapError, BootstrapPlan, BootstrapReport, SchemaBootstrapper,
    VerificationReport,
};
