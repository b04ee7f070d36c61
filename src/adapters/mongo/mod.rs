//! MongoDB adapter for the schema store port.

pub mod connection;
pub mod errors;
pub mod store;

pub use connection::MongoConnection;
pub use store::MongoSchemaStore;
