//! Error handling and producer statistics.
//!
//! This module provides:
//! - Error type definitions for encoding, configuration, client and producer failures
//! - Producer statistics tracking (enqueued, sent, retried, dead-lettered records)
//! - Retry backoff strategy configuration

mod retry;
mod stats;
mod types;

// Re-export public API
pub use retry::get_retry_strategy;
pub use stats::{ProducerStats, StatsSnapshot};
pub use types::{ClientError, ConfigError, EncodeError, InitializationError, ProducerError};
