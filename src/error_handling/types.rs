//! Error type definitions.
//!
//! This module defines all error types used throughout the producer.

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Error returned when a payload cannot be turned into record bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A platform string (path, OS string) was not valid Unicode.
    #[error("record data is not valid UTF-8: {0}")]
    InvalidUtf8(String),
}

/// Error raised by a [`StreamClient`](crate::client::StreamClient).
///
/// The retry engine treats every variant as a failure of the whole batch it
/// was sending; none of them reach the caller of `put`.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request could not be built (e.g. a required field was rejected).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The service or the transport failed the call.
    #[error("stream service error: {0}")]
    Service(String),

    /// The call did not finish within the configured request timeout.
    #[error("request timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Invalid producer configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The stream name was empty.
    #[error("stream name must not be empty")]
    EmptyStreamName,

    /// A threshold that must be positive was zero.
    #[error("{0} must be greater than zero")]
    ZeroThreshold(&'static str),

    /// The dispatch pool cannot host the monitor plus at least one flush worker.
    #[error("thread pool needs at least {min} workers, got {got}")]
    TooFewThreads {
        /// Minimum accepted pool size
        min: usize,
        /// Configured pool size
        got: usize,
    },

    /// No client was injected and the default client is not compiled in.
    #[error("no stream client configured (enable the `kinesis` feature or inject one)")]
    MissingClient,
}

/// Error types for producer operations.
#[derive(Error, Debug)]
pub enum ProducerError {
    /// The payload could not be encoded.
    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),

    /// The configuration was rejected.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The default stream client could not be created.
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// Abandoned records could not be written to the dead-letter file.
    ///
    /// There is no further fallback tier, so these records are lost.
    #[error("Dead-letter write failed for {records} records: {source}")]
    DeadLetter {
        /// Number of records that could not be persisted
        records: usize,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The producer (or its dispatch pool) has been closed.
    #[error("producer is closed")]
    Closed,

    /// Generic I/O error (dead-letter recovery).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
