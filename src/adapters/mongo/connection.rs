use std::time::Duration;

use mongodb::options::ClientOptions;
use mongodb::Client;
use tracing::debug;

use super::errors::classify;
use super::store::MongoSchemaStore;
use crate::domain::models::MongoConfig;
use crate::domain::ports::StoreError;

/// MongoDB client manager
///
/// Owns the driver client. The driver pools connections internally and
/// connects lazily, so building a connection does not touch the network.
pub struct MongoConnection {
    client: Client,
    database: String,
}

impl MongoConnection {
    /// Build a client from configuration
    ///
    /// # Configuration
    /// - `uri`: connection string, parsed by the driver (SRV lookups included)
    /// - `app_name`: reported in server logs
    /// - `connect_timeout_ms` / `server_selection_timeout_ms`: bound each attempt,
    ///   so the readiness loop gets control back quickly
    pub async fn connect(config: &MongoConfig) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(config.uri.as_str()).await.map_err(classify)?;
        options.app_name = Some(config.app_name.clone());
        options.connect_timeout = Some(Duration::from_millis(config.connect_timeout_ms));
        options.server_selection_timeout =
            Some(Duration::from_millis(config.server_selection_timeout_ms));

        let client = Client::with_options(options).map_err(classify)?;
        debug!(database = %config.database, app_name = %config.app_name, "mongodb client created");

        Ok(Self {
            client,
            database: config.database.clone(),
        })
    }

    /// Store bound to the configured database
    pub fn store(&self) -> MongoSchemaStore {
        MongoSchemaStore::new(self.client.database(&self.database))
    }

    /// Get a reference to the driver client
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Close the client gracefully
    pub async fn close(self) {
        self.client.shutdown().await;
    }
}
