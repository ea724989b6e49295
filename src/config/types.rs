//! Configuration types.
//!
//! This module defines the producer configuration and the enums shared between
//! the library and the command-line interface.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use crate::config::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_BATCH_SIZE_BYTES, DEFAULT_BATCH_TIME, DEFAULT_DEAD_LETTER_PATH,
    DEFAULT_MAX_RETRIES, DEFAULT_THREADS, MIN_THREADS,
};
use crate::error_handling::ConfigError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// On-disk framing of records written to the dead-letter file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum DeadLetterFormat {
    /// 4-byte big-endian length followed by the record data (default)
    #[default]
    LengthPrefixed,
    /// Record data followed by a newline
    NewlineDelimited,
    /// Record data with no delimiter; record boundaries cannot be recovered
    Raw,
}

/// Producer configuration.
///
/// Immutable once the producer is built. Construct it with struct update
/// syntax over [`Default`].
///
/// # Examples
///
/// ```
/// use kinesis_producer::ProducerConfig;
/// use std::time::Duration;
///
/// let config = ProducerConfig {
///     stream_name: "clicks".to_string(),
///     batch_size: 100,
///     batch_time: Duration::from_secs(1),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Name of the stream receiving the records
    pub stream_name: String,

    /// Number of queued records that triggers a flush; also the maximum batch length
    pub batch_size: usize,

    /// Estimated queued bytes that trigger a flush; also the maximum batch size in bytes
    pub batch_size_bytes: usize,

    /// Maximum time records wait before the monitor flushes them
    pub batch_time: Duration,

    /// Resends allowed after the first attempt before records are dead-lettered
    pub max_retries: usize,

    /// Dispatch pool size (the monitor holds one worker)
    pub threads: usize,

    /// File receiving records whose retries were exhausted
    pub dead_letter_path: PathBuf,

    /// Framing used in the dead-letter file
    pub dead_letter_format: DeadLetterFormat,

    /// Optional upper bound on a single call to the stream service
    pub request_timeout: Option<Duration>,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            stream_name: String::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_size_bytes: DEFAULT_BATCH_SIZE_BYTES,
            batch_time: DEFAULT_BATCH_TIME,
            max_retries: DEFAULT_MAX_RETRIES,
            threads: DEFAULT_THREADS,
            dead_letter_path: PathBuf::from(DEFAULT_DEAD_LETTER_PATH),
            dead_letter_format: DeadLetterFormat::default(),
            request_timeout: None,
        }
    }
}

impl ProducerConfig {
    /// Creates a configuration for `stream_name` with every other field defaulted.
    pub fn for_stream(stream_name: impl Into<String>) -> Self {
        Self {
            stream_name: stream_name.into(),
            ..Default::default()
        }
    }

    /// Checks that the configuration can drive a producer.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an empty stream name, a zero batch
    /// threshold or interval, or a pool too small to host the monitor and a
    /// flush worker.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stream_name.trim().is_empty() {
            return Err(ConfigError::EmptyStreamName);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroThreshold("batch_size"));
        }
        if self.batch_size_bytes == 0 {
            return Err(ConfigError::ZeroThreshold("batch_size_bytes"));
        }
        if self.batch_time.is_zero() {
            return Err(ConfigError::ZeroThreshold("batch_time"));
        }
        if matches!(self.request_timeout, Some(timeout) if timeout.is_zero()) {
            return Err(ConfigError::ZeroThreshold("request_timeout"));
        }
        if self.threads < MIN_THREADS {
            return Err(ConfigError::TooFewThreads {
                min: MIN_THREADS,
                got: self.threads,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Warn),
            log::LevelFilter::Warn
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Info),
            log::LevelFilter::Info
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_config_default() {
        let config = ProducerConfig::default();
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.batch_size_bytes, 5 * 1024 * 1024);
        assert_eq!(config.batch_time, Duration::from_secs(5));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.threads, 10);
        assert_eq!(config.dead_letter_path, PathBuf::from("failed_records.dlq"));
        assert_eq!(config.dead_letter_format, DeadLetterFormat::LengthPrefixed);
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn test_default_config_needs_a_stream_name() {
        assert_eq!(
            ProducerConfig::default().validate(),
            Err(ConfigError::EmptyStreamName)
        );
        assert!(ProducerConfig::for_stream("events").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_thresholds() {
        let base = ProducerConfig::for_stream("events");

        let config = ProducerConfig {
            batch_size: 0,
            ..base.clone()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroThreshold("batch_size"))
        );

        let config = ProducerConfig {
            batch_size_bytes: 0,
            ..base.clone()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroThreshold("batch_size_bytes"))
        );

        let config = ProducerConfig {
            batch_time: Duration::ZERO,
            ..base.clone()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroThreshold("batch_time"))
        );

        let config = ProducerConfig {
            request_timeout: Some(Duration::ZERO),
            ..base
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroThreshold("request_timeout"))
        );
    }

    #[test]
    fn test_validate_rejects_single_worker_pool() {
        let config = ProducerConfig {
            threads: 1,
            ..ProducerConfig::for_stream("events")
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooFewThreads { min: 2, got: 1 })
        );
    }

    #[test]
    fn test_validate_allows_zero_retries() {
        let config = ProducerConfig {
            max_retries: 0,
            ..ProducerConfig::for_stream("events")
        };
        assert!(config.validate().is_ok());
    }
}
