//! Flush notification.

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Describes one completed flush.
///
/// Data, partition key and metadata are those of the *last* record of the
/// flushed batch.
#[derive(Debug, Clone)]
pub struct FlushEvent<M = serde_json::Value> {
    /// Number of records drained and sent in this flush
    pub count: usize,
    /// Wall-clock time at which the flush completed
    pub timestamp: DateTime<Utc>,
    /// Metadata supplied with the last record, if any
    pub metadata: Option<M>,
    /// Partition key of the last record
    pub partition_key: String,
    /// Payload of the last record
    pub data: Vec<u8>,
    /// How many records of the batch ended up in the dead-letter file
    pub dead_lettered: usize,
}

/// Callback invoked after every flush that sent at least one record.
pub type FlushCallback<M = serde_json::Value> = Arc<dyn Fn(FlushEvent<M>) + Send + Sync>;
