// Shared test helpers: a scriptable in-memory stream client and producer setup.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use kinesis_producer::{
    ClientError, FlushEvent, Producer, ProducerConfig, PutRecordsOutput, PutRecordsResultEntry,
    Record, StreamClient,
};
use tokio::time::Instant;

/// How the mock answers one `put_records` call.
#[allow(dead_code)] // Not every test file uses every variant
#[derive(Debug, Clone)]
pub enum Reply {
    /// Accept every record
    Accept,
    /// Reject the records at these positions of the request
    FailPositions(Vec<usize>),
    /// Reject every record with a per-record error code
    FailAll,
    /// Fail the call itself
    TransportError,
}

/// One recorded call to the mock.
#[derive(Debug, Clone)]
pub struct Call {
    pub records: Vec<Record>,
    pub at: Instant,
}

/// Stream client that records every call and answers from a script.
///
/// Once the script is exhausted every call gets `fallback`.
pub struct MockClient {
    script: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    calls: Mutex<Vec<Call>>,
}

#[allow(dead_code)] // Used by other test files
impl MockClient {
    pub fn accepting() -> Arc<Self> {
        Self::scripted(Vec::new(), Reply::Accept)
    }

    pub fn failing() -> Arc<Self> {
        Self::scripted(Vec::new(), Reply::FailAll)
    }

    pub fn scripted(script: Vec<Reply>, fallback: Reply) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Every record received, in call order, including resends.
    pub fn records(&self) -> Vec<Record> {
        self.calls()
            .into_iter()
            .flat_map(|call| call.records)
            .collect()
    }
}

#[async_trait]
impl StreamClient for MockClient {
    async fn put_records(
        &self,
        _stream_name: &str,
        records: &[Record],
    ) -> Result<PutRecordsOutput, ClientError> {
        self.calls.lock().unwrap().push(Call {
            records: records.to_vec(),
            at: Instant::now(),
        });
        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match reply {
            Reply::Accept => Ok(PutRecordsOutput::all_succeeded(records.len())),
            Reply::FailPositions(positions) => {
                let positions: HashSet<usize> = positions.into_iter().collect();
                Ok(PutRecordsOutput::from_entries(
                    (0..records.len())
                        .map(|i| {
                            if positions.contains(&i) {
                                PutRecordsResultEntry::failure(
                                    "ProvisionedThroughputExceededException",
                                    "Rate exceeded for shard",
                                )
                            } else {
                                PutRecordsResultEntry::success()
                            }
                        })
                        .collect(),
                ))
            }
            Reply::FailAll => Ok(PutRecordsOutput::from_entries(
                records
                    .iter()
                    .map(|_| PutRecordsResultEntry::failure("InternalFailure", "boom"))
                    .collect(),
            )),
            Reply::TransportError => Err(ClientError::Service("connection reset".to_string())),
        }
    }
}

/// Config writing dead letters into `dir`, with thresholds high enough that
/// tests decide when flushes happen.
#[allow(dead_code)] // Used by other test files
pub fn test_config(dir: &Path) -> ProducerConfig {
    ProducerConfig {
        batch_size: 500,
        batch_time: Duration::from_secs(5),
        max_retries: 5,
        threads: 2,
        dead_letter_path: dir.join("failed.dlq"),
        ..ProducerConfig::for_stream("test-stream")
    }
}

/// Builds a producer on `client` that collects every flush event.
#[allow(dead_code)] // Used by other test files
pub async fn producer_with_events(
    config: ProducerConfig,
    client: Arc<MockClient>,
) -> (Producer, Arc<Mutex<Vec<FlushEvent>>>) {
    let events: Arc<Mutex<Vec<FlushEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let producer = Producer::builder(config)
        .client(client)
        .on_flush(move |event: FlushEvent| sink.lock().unwrap().push(event))
        .build()
        .await
        .expect("Failed to build producer");
    (producer, events)
}

/// Lets scheduled flush jobs run to completion.
///
/// Under a paused clock the runtime only advances time once every task is
/// idle, so a short sleep waits for all ready work without adding delay.
#[allow(dead_code)] // Used by other test files
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
