//! Producer configuration and constants.
//!
//! This module provides:
//! - Configuration constants (batch thresholds, flush interval, retry backoff)
//! - The `ProducerConfig` struct and its validation
//! - CLI option types and parsing

mod cli;
mod constants;
mod types;

// Re-export all constants
pub use cli::Cli;
pub use constants::*;
pub use types::{DeadLetterFormat, LogFormat, LogLevel, ProducerConfig};
