//! Command-line options for the `kinesis_producer` binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_BATCH_SIZE_BYTES, DEFAULT_BATCH_TIME, DEFAULT_DEAD_LETTER_PATH,
    DEFAULT_MAX_RETRIES, DEFAULT_THREADS,
};
use crate::config::types::{DeadLetterFormat, LogFormat, LogLevel, ProducerConfig};

/// Reads newline-delimited records and puts them to a stream in batches.
#[derive(Debug, Clone, Parser)]
#[command(name = "kinesis_producer", version, about)]
pub struct Cli {
    /// Name of the stream receiving the records
    #[arg(long, short = 's')]
    pub stream_name: String,

    /// File with one record per line ("-" reads stdin)
    #[arg(default_value = "-")]
    pub file: PathBuf,

    /// Partition key for every record (random per record when omitted)
    #[arg(long, short = 'k')]
    pub partition_key: Option<String>,

    /// Queued records that trigger a flush
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Queued bytes (estimated) that trigger a flush
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE_BYTES)]
    pub batch_size_bytes: usize,

    /// Seconds records may wait before the periodic flush picks them up
    #[arg(long, default_value_t = DEFAULT_BATCH_TIME.as_secs())]
    pub batch_time: u64,

    /// Resends allowed before records are dead-lettered
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: usize,

    /// Worker pool size (one worker runs the periodic flush monitor)
    #[arg(long, default_value_t = DEFAULT_THREADS)]
    pub threads: usize,

    /// File receiving records whose retries were exhausted
    #[arg(long, default_value = DEFAULT_DEAD_LETTER_PATH)]
    pub dead_letter_path: PathBuf,

    /// Framing of records in the dead-letter file
    #[arg(long, value_enum, default_value_t = DeadLetterFormat::LengthPrefixed)]
    pub dead_letter_format: DeadLetterFormat,

    /// Per-request timeout in seconds for calls to the stream service
    #[arg(long)]
    pub request_timeout: Option<u64>,

    /// Log batches instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Builds the producer configuration described by the options.
    pub fn producer_config(&self) -> ProducerConfig {
        ProducerConfig {
            stream_name: self.stream_name.clone(),
            batch_size: self.batch_size,
            batch_size_bytes: self.batch_size_bytes,
            batch_time: Duration::from_secs(self.batch_time),
            max_retries: self.max_retries,
            threads: self.threads,
            dead_letter_path: self.dead_letter_path.clone(),
            dead_letter_format: self.dead_letter_format,
            request_timeout: self.request_timeout.map(Duration::from_secs),
        }
    }

    /// Returns `true` when records should be read from stdin.
    pub fn reads_stdin(&self) -> bool {
        self.file.as_os_str() == "-"
    }
}
