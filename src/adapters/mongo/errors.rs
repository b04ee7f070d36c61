//! Mapping of driver errors onto [`StoreError`].

use mongodb::error::{Error, ErrorKind, WriteFailure};

use crate::domain::ports::{CollectionOutcome, StoreError};

/// `NamespaceNotFound`: listing indexes of a collection that does not exist.
pub const NAMESPACE_NOT_FOUND: i32 = 26;
/// `NamespaceExists`: `create` on an existing collection.
pub const NAMESPACE_EXISTS: i32 = 48;
/// `IndexOptionsConflict`: same keys or name, different options.
pub const INDEX_OPTIONS_CONFLICT: i32 = 85;
/// `IndexKeySpecsConflict`: same name, different keys.
pub const INDEX_KEY_SPECS_CONFLICT: i32 = 86;
/// `DuplicateKey`: unique index violation.
pub const DUPLICATE_KEY: i32 = 11000;

/// Server error code carried by a command or write error, if any.
pub fn server_code(err: &Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => Some(command.code),
        ErrorKind::Write(WriteFailure::WriteError(write)) => Some(write.code),
        _ => None,
    }
}

fn is_connection_failure(err: &Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Io(_)
            | ErrorKind::ServerSelection { .. }
            | ErrorKind::ConnectionPoolCleared { .. }
            | ErrorKind::DnsResolve { .. }
    )
}

/// Resolve a failed `create`: an existing namespace is not an error.
pub fn create_collection_error(err: Error) -> Result<CollectionOutcome, StoreError> {
    if server_code(&err) == Some(NAMESPACE_EXISTS) {
        return Ok(CollectionOutcome::AlreadyExists);
    }
    Err(classify(err))
}

/// Classify an error raised while creating an index on `collection`.
pub fn index_error(err: Error, collection: &str, index: &str) -> StoreError {
    match server_code(&err) {
        Some(INDEX_OPTIONS_CONFLICT | INDEX_KEY_SPECS_CONFLICT) => StoreError::IndexConflict {
            collection: collection.to_string(),
            index: index.to_string(),
            message: err.to_string(),
        },
        Some(DUPLICATE_KEY) => StoreError::DuplicateKey {
            collection: collection.to_string(),
            message: err.to_string(),
        },
        _ => classify(err),
    }
}

/// Classify an error raised while writing to `collection`.
pub fn write_error(err: Error, collection: &str) -> StoreError {
    if server_code(&err) == Some(DUPLICATE_KEY) {
        return StoreError::DuplicateKey {
            collection: collection.to_string(),
            message: err.to_string(),
        };
    }
    classify(err)
}

/// Classify an error with no operation-specific meaning.
pub fn classify(err: Error) -> StoreError {
    if is_connection_failure(&err) {
        StoreError::Connection(err.to_string())
    } else {
        StoreError::Backend(err.to_string())
    }
}
