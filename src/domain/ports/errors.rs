use thiserror::Error;

/// Errors surfaced by a schema store.
///
/// "Already exists" outcomes are not errors; they are reported through
/// [`CollectionOutcome`](super::CollectionOutcome) and `create_index`
/// returning normally.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Index conflict on '{collection}' for '{index}': {message}")]
    IndexConflict {
        collection: String,
        index: String,
        message: String,
    },

    #[error("Duplicate key in '{collection}': {message}")]
    DuplicateKey { collection: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Backend(String),
}

impl StoreError {
    /// True for failures that may go away once the server is reachable.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<mongodb::bson::ser::Error> for StoreError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
