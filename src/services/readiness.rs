//! Wait for the database to accept connections.
//!
//! At container startup the bootstrap usually races the database. Connection
//! failures are retried with exponential backoff; any other error ends the
//! wait at once.

use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use tracing::{info, warn};

use crate::domain::models::RetryConfig;
use crate::domain::ports::{SchemaStore, StoreError};

fn backoff_policy(config: &RetryConfig) -> backoff::ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(config.initial_backoff_ms))
        .with_max_interval(Duration::from_millis(config.max_backoff_ms))
        .with_max_elapsed_time(Some(Duration::from_millis(config.max_elapsed_ms)))
        .build()
}

/// Ping `store` until it answers or the retry budget is spent.
///
/// # Errors
/// The last connection error once `max_elapsed_ms` has passed, or the first
/// non-connection error.
pub async fn wait_until_ready<S: SchemaStore + ?Sized>(
    store: &S,
    config: &RetryConfig,
) -> Result<(), StoreError> {
    let mut attempts = 0_u32;

    backoff::future::retry_notify(
        backoff_policy(config),
        || {
            attempts += 1;
            async move {
                store.ping().await.map_err(|err| {
                    if err.is_transient() {
                        backoff::Error::transient(err)
                    } else {
                        backoff::Error::permanent(err)
                    }
                })
            }
        },
        |err: StoreError, wait: Duration| {
            warn!(error = %err, retry_in_ms = wait.as_millis(), "database not reachable yet");
        },
    )
    .await?;

    info!(database = store.database_name(), attempts, "database reachable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySchemaStore;

    fn fast_retry(max_elapsed_ms: u64) -> RetryConfig {
        RetryConfig {
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
            max_elapsed_ms,
        }
    }

    #[tokio::test]
    async fn test_ready_store_needs_one_ping() {
        let store = InMemorySchemaStore::new("db");
        wait_until_ready(&store, &fast_retry(1_000)).await.unwrap();
    }

    #[tokio::test]
    async fn test_retries_until_store_answers() {
        let store = InMemorySchemaStore::new("db").with_unavailable_pings(3);
        wait_until_ready(&store, &fast_retry(5_000)).await.unwrap();
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_gives_up_after_max_elapsed() {
        let store = InMemorySchemaStore::new("db").with_unavailable_pings(u32::MAX);
        let err = wait_until_ready(&store, &fast_retry(30)).await.unwrap_err();
        assert!(matches!(err, StoreError::Connection(_)));
    }
}
