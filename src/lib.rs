//! kinesis_producer library: batching producer for partitioned streams
//!
//! This library buffers records emitted by callers and sends them to an AWS
//! Kinesis style stream in bounded batches. Batches are flushed when a record
//! count or byte threshold is reached, or periodically when traffic is sparse.
//! Records the service rejects are resent with exponential backoff; records
//! that still fail after the retry ceiling are appended to a local
//! dead-letter file.
//!
//! Delivery is at-least-once and best effort. Only records sharing a
//! partition key keep their relative order.
//!
//! # Example
//!
//! ```no_run
//! use kinesis_producer::{Producer, ProducerConfig};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProducerConfig {
//!     batch_size: 200,
//!     batch_time: Duration::from_secs(2),
//!     ..ProducerConfig::for_stream("clicks")
//! };
//!
//! // Uses the AWS Kinesis client configured from the environment
//! let producer: Producer = Producer::builder(config).build().await?;
//! producer.put(r#"{"page":"/"}"#, None, Some("session-17"))?;
//! producer.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Producers spawn their dispatch pool
//! and flush monitor on the runtime they are built in.

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod dead_letter;
mod dispatch;
mod encoder;
mod error_handling;
pub mod initialization;
mod producer;
mod queue;
mod record;
mod sender;

// Re-export public API
#[cfg(feature = "kinesis")]
pub use client::KinesisClient;
pub use client::{DryRunClient, PutRecordsOutput, PutRecordsResultEntry, StreamClient};
pub use config::{Cli, DeadLetterFormat, LogFormat, LogLevel, ProducerConfig};
pub use dead_letter::{read_dead_letters, DeadLetterSink};
pub use encoder::{encode_data, IntoRecordData};
pub use error_handling::{
    ClientError, ConfigError, EncodeError, InitializationError, ProducerError, StatsSnapshot,
};
pub use producer::{FlushCallback, FlushEvent, Producer, ProducerBuilder};
pub use record::{random_partition_key, Record};
