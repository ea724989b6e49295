//! Configuration constants.
//!
//! This module defines the defaults and fixed operational parameters of the
//! producer: batch thresholds, flush cadence, retry ceiling and backoff shape.

use std::time::Duration;

/// Default maximum number of records per batch.
/// Matches the PutRecords per-request record limit of Kinesis.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Default maximum estimated bytes per batch (5 MiB).
/// Matches the PutRecords per-request payload limit of Kinesis.
pub const DEFAULT_BATCH_SIZE_BYTES: usize = 5 * 1024 * 1024;

/// Default flush interval used by the monitor task.
pub const DEFAULT_BATCH_TIME: Duration = Duration::from_secs(5);

/// Default number of resends after the initial attempt before dead-lettering.
pub const DEFAULT_MAX_RETRIES: usize = 5;

/// Default dispatch pool size (monitor + flush workers).
pub const DEFAULT_THREADS: usize = 10;

/// Smallest accepted dispatch pool: the monitor permanently holds one worker,
/// flushes need at least one more.
pub const MIN_THREADS: usize = 2;

/// Default dead-letter file, relative to the working directory.
pub const DEFAULT_DEAD_LETTER_PATH: &str = "failed_records.dlq";

/// Fixed per-record overhead added to the size estimate
/// (framing and bookkeeping on top of data and partition key).
pub const RECORD_OVERHEAD_BYTES: usize = 16;

// Backoff between resends: RETRY_BACKOFF_FACTOR_MS * RETRY_BACKOFF_BASE^attempt
/// Exponential base of the resend backoff
pub const RETRY_BACKOFF_BASE: u64 = 2;
/// Multiplier of the resend backoff in milliseconds (0.1s)
pub const RETRY_BACKOFF_FACTOR_MS: u64 = 100;

/// Number of payload bytes included in debug log lines for a record.
pub const LOG_PREVIEW_BYTES: usize = 100;
