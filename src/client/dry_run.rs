//! Client that logs batches instead of sending them.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{PutRecordsOutput, StreamClient};
use crate::error_handling::ClientError;
use crate::record::Record;

/// Accepts every record and logs what would have been sent.
///
/// Used by the binary's `--dry-run` flag to exercise batching and flush
/// cadence without AWS credentials.
#[derive(Debug, Default)]
pub struct DryRunClient {
    records_seen: AtomicUsize,
}

impl DryRunClient {
    /// Creates a client that has seen no records.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records accepted so far.
    pub fn records_seen(&self) -> usize {
        self.records_seen.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl StreamClient for DryRunClient {
    async fn put_records(
        &self,
        stream_name: &str,
        records: &[Record],
    ) -> Result<PutRecordsOutput, ClientError> {
        log::info!(
            "[dry-run] PutRecords to {}: {} records",
            stream_name,
            records.len()
        );
        for record in records {
            log::debug!(
                "[dry-run] {} => \"{}\"",
                record.partition_key,
                record.preview()
            );
        }
        self.records_seen.fetch_add(records.len(), Ordering::Relaxed);
        Ok(PutRecordsOutput::all_succeeded(records.len()))
    }
}
