//! Record types.
//!
//! A [`Record`] is what the stream service receives. While it waits in the
//! buffer queue it travels as a [`QueuedRecord`], which also carries the
//! caller's metadata and the size estimate used by the byte threshold.

use rand::Rng;

use crate::config::{LOG_PREVIEW_BYTES, RECORD_OVERHEAD_BYTES};

/// A record as sent to the stream service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Payload bytes
    pub data: Vec<u8>,
    /// Key routing the record to a shard; never empty
    pub partition_key: String,
}

impl Record {
    /// Creates a record, generating a random partition key when `partition_key`
    /// is `None` or empty.
    pub fn new(data: Vec<u8>, partition_key: Option<&str>) -> Self {
        let partition_key = match partition_key {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => random_partition_key(),
        };
        Self {
            data,
            partition_key,
        }
    }

    /// Estimated serialized size of the record in bytes.
    ///
    /// Data and partition key both count against the service's request size
    /// limit; a fixed overhead accounts for framing.
    pub fn size_bytes(&self) -> usize {
        self.data.len() + self.partition_key.len() + RECORD_OVERHEAD_BYTES
    }

    /// Lossy text preview of the payload for log lines.
    pub(crate) fn preview(&self) -> String {
        let end = self.data.len().min(LOG_PREVIEW_BYTES);
        String::from_utf8_lossy(&self.data[..end]).into_owned()
    }
}

/// A record waiting in the buffer queue.
#[derive(Debug, Clone)]
pub struct QueuedRecord<M> {
    /// The record that will be sent
    pub record: Record,
    /// Caller metadata, stripped before sending
    pub metadata: Option<M>,
    /// Size estimate captured at enqueue time
    pub size_bytes: usize,
}

impl<M> QueuedRecord<M> {
    pub fn new(record: Record, metadata: Option<M>) -> Self {
        let size_bytes = record.size_bytes();
        Self {
            record,
            metadata,
            size_bytes,
        }
    }
}

/// Generates a fresh random partition key: 128 random bits as 32 lowercase hex digits.
pub fn random_partition_key() -> String {
    format!("{:032x}", rand::rng().random::<u128>())
}
