//! AWS Kinesis implementation of [`StreamClient`].

use async_trait::async_trait;
use aws_sdk_kinesis::error::DisplayErrorContext;
use aws_sdk_kinesis::primitives::Blob;
use aws_sdk_kinesis::types::PutRecordsRequestEntry;

use super::{PutRecordsOutput, PutRecordsResultEntry, StreamClient};
use crate::error_handling::ClientError;
use crate::record::Record;

/// Stream client backed by the AWS SDK.
#[derive(Debug, Clone)]
pub struct KinesisClient {
    client: aws_sdk_kinesis::Client,
}

impl KinesisClient {
    /// Wraps an already configured SDK client.
    pub fn new(client: aws_sdk_kinesis::Client) -> Self {
        Self { client }
    }

    /// Builds a client from the ambient AWS configuration
    /// (environment, shared config files, instance metadata).
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(aws_sdk_kinesis::Client::new(&config))
    }
}

#[async_trait]
impl StreamClient for KinesisClient {
    async fn put_records(
        &self,
        stream_name: &str,
        records: &[Record],
    ) -> Result<PutRecordsOutput, ClientError> {
        let entries = records
            .iter()
            .map(|record| {
                PutRecordsRequestEntry::builder()
                    .data(Blob::new(record.data.clone()))
                    .partition_key(record.partition_key.clone())
                    .build()
                    .map_err(|e| ClientError::InvalidRequest(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let output = self
            .client
            .put_records()
            .stream_name(stream_name)
            .set_records(Some(entries))
            .send()
            .await
            .map_err(|e| ClientError::Service(DisplayErrorContext(&e).to_string()))?;

        let results = output
            .records()
            .iter()
            .map(|entry| PutRecordsResultEntry {
                error_code: entry.error_code().map(str::to_string),
                error_message: entry.error_message().map(str::to_string),
            })
            .collect();

        Ok(PutRecordsOutput {
            failed_record_count: output.failed_record_count().unwrap_or(0).max(0) as usize,
            records: results,
        })
    }
}
