pub mod config;
pub mod records;
pub mod schema;

pub use config::{Config, LoggingConfig, MongoConfig, RetryConfig};
pub use records::{
    CollectionRecord, InstanceRecord, NodeRecord, PromptRecord, RequesterArgs, ResponseRecord,
    TaskRecord, TokenizerRecord,
};
pub use schema::{
    lookup_path, CollectionSpec, IndexField, IndexSpec, SchemaDefinition, SchemaViolation,
    SortOrder, DEFAULT_DATABASE,
};
