//! Producer construction.

use std::sync::Arc;

use crate::client::StreamClient;
use crate::config::ProducerConfig;
use crate::error_handling::ProducerError;

use super::notify::{FlushCallback, FlushEvent};
use super::Producer;

/// Builder for [`Producer`].
///
/// The stream client defaults to [`KinesisClient`](crate::client::KinesisClient)
/// built from the ambient AWS configuration when the `kinesis` feature is
/// enabled; otherwise a client must be injected.
pub struct ProducerBuilder<M = serde_json::Value> {
    config: ProducerConfig,
    client: Option<Arc<dyn StreamClient>>,
    on_flush: Option<FlushCallback<M>>,
}

impl<M: Send + 'static> ProducerBuilder<M> {
    /// Starts a builder with no client override and no flush callback.
    pub fn new(config: ProducerConfig) -> Self {
        Self {
            config,
            client: None,
            on_flush: None,
        }
    }

    /// Uses `client` instead of the default Kinesis client.
    pub fn client(mut self, client: Arc<dyn StreamClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Registers a callback invoked after every flush.
    pub fn on_flush<F>(mut self, callback: F) -> Self
    where
        F: Fn(FlushEvent<M>) + Send + Sync + 'static,
    {
        self.on_flush = Some(Arc::new(callback));
        self
    }

    /// Validates the configuration, resolves the client and starts the producer.
    ///
    /// Must run inside a Tokio runtime: the dispatch pool and the flush
    /// monitor are spawned here.
    ///
    /// # Errors
    ///
    /// Returns `ProducerError::Config` for an invalid configuration, or when
    /// no client was injected and the default client is not compiled in.
    pub async fn build(self) -> Result<Producer<M>, ProducerError> {
        self.config.validate()?;
        let client = match self.client {
            Some(client) => client,
            None => default_client().await?,
        };
        Ok(Producer::start(self.config, client, self.on_flush))
    }
}

#[cfg(feature = "kinesis")]
async fn default_client() -> Result<Arc<dyn StreamClient>, ProducerError> {
    log::debug!("No stream client injected; using the AWS Kinesis client");
    Ok(Arc::new(crate::client::KinesisClient::from_env().await))
}

#[cfg(not(feature = "kinesis"))]
async fn default_client() -> Result<Arc<dyn StreamClient>, ProducerError> {
    Err(crate::error_handling::ConfigError::MissingClient.into())
}
