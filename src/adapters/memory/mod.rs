pub mod store;

pub use store::InMemorySchemaStore;
