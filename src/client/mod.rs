//! Stream service boundary.
//!
//! The producer only needs one capability from the service: put a batch of
//! records to a named stream and learn which positions were rejected. That
//! capability is the [`StreamClient`] trait, so tests and alternative
//! transports can be injected in place of the real Kinesis client.

mod dry_run;
#[cfg(feature = "kinesis")]
mod kinesis;

use async_trait::async_trait;

use crate::error_handling::ClientError;
use crate::record::Record;

pub use dry_run::DryRunClient;
#[cfg(feature = "kinesis")]
pub use kinesis::KinesisClient;

/// Per-record outcome of a batched put, aligned with the request by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutRecordsResultEntry {
    /// Service error code; `None` (or empty) means the record was accepted
    pub error_code: Option<String>,
    /// Human-readable error detail, if any
    pub error_message: Option<String>,
}

impl PutRecordsResultEntry {
    /// An accepted record.
    pub fn success() -> Self {
        Self::default()
    }

    /// A rejected record.
    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: Some(code.into()),
            error_message: Some(message.into()),
        }
    }

    /// Returns `true` when the entry carries a non-empty error code.
    pub fn is_failed(&self) -> bool {
        self.error_code.as_deref().is_some_and(|code| !code.is_empty())
    }
}

/// Response of a batched put.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutRecordsOutput {
    /// Number of records the service rejected
    pub failed_record_count: usize,
    /// One entry per request record, in request order
    pub records: Vec<PutRecordsResultEntry>,
}

impl PutRecordsOutput {
    /// Builds an output from per-record entries, deriving the failed count.
    pub fn from_entries(records: Vec<PutRecordsResultEntry>) -> Self {
        let failed_record_count = records.iter().filter(|entry| entry.is_failed()).count();
        Self {
            failed_record_count,
            records,
        }
    }

    /// An output accepting all `count` records.
    pub fn all_succeeded(count: usize) -> Self {
        Self::from_entries(vec![PutRecordsResultEntry::success(); count])
    }
}

/// Batched write access to a partitioned stream.
#[async_trait]
pub trait StreamClient: Send + Sync {
    /// Puts `records` to `stream_name` in one request.
    ///
    /// Partial failure is reported through the output, not as an error;
    /// `Err` means the request as a whole did not go through.
    async fn put_records(
        &self,
        stream_name: &str,
        records: &[Record],
    ) -> Result<PutRecordsOutput, ClientError>;
}
