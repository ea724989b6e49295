//! Batching producer.
//!
//! Callers hand records to [`Producer::put`]; they are queued and flushed in
//! bounded batches when a count/byte threshold is reached or when the monitor
//! finds records that have waited longer than the flush interval. Flushes run
//! on the dispatch pool, so `put` never waits on the network.
//!
//! ```text
//! put() ──▶ BufferQueue ──(threshold)──▶ DispatchPool ──▶ BatchSender ──▶ stream
//!               ▲                             │                 │
//!               └──────── monitor ◀───────────┘                 └──▶ dead-letter file
//! ```

mod builder;
mod monitor;
mod notify;

use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use futures::FutureExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::client::StreamClient;
use crate::config::ProducerConfig;
use crate::dead_letter::DeadLetterSink;
use crate::dispatch::DispatchPool;
use crate::encoder::{encode_data, IntoRecordData};
use crate::error_handling::{ProducerError, ProducerStats, StatsSnapshot};
use crate::queue::BufferQueue;
use crate::record::{QueuedRecord, Record};
use crate::sender::BatchSender;

pub use builder::ProducerBuilder;
pub use notify::{FlushCallback, FlushEvent};

/// State shared by the caller-facing handle, the monitor and flush jobs.
pub(crate) struct Shared<M> {
    config: ProducerConfig,
    queue: BufferQueue<M>,
    sender: BatchSender,
    last_flush: Mutex<Instant>,
    on_flush: Option<FlushCallback<M>>,
    stats: Arc<ProducerStats>,
}

impl<M: Send + 'static> Shared<M> {
    /// Drains one batch and sends it.
    ///
    /// Returns the number of records drained; 0 means the queue was empty and
    /// nothing was sent or notified.
    async fn flush(&self) -> Result<usize, ProducerError> {
        let batch = self
            .queue
            .drain_batch(self.config.batch_size, self.config.batch_size_bytes);
        if batch.is_empty() {
            return Ok(0);
        }

        let count = batch.len();
        self.stats.record_batch();

        let mut last_metadata = None;
        let records: Vec<Record> = batch
            .into_iter()
            .map(|entry| {
                last_metadata = entry.metadata;
                entry.record
            })
            .collect();
        let last = records.last().cloned();

        log::debug!(
            "Flushing {} records to {}",
            count,
            self.config.stream_name
        );
        let outcome = self.sender.send(records).await?;
        log::debug!(
            "Flushed {} records ({} sent, {} dead-lettered, {} attempts)",
            count,
            outcome.sent,
            outcome.dead_lettered,
            outcome.attempts
        );

        *self.last_flush.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();

        if let (Some(callback), Some(last)) = (&self.on_flush, last) {
            callback(FlushEvent {
                count,
                timestamp: Utc::now(),
                metadata: last_metadata,
                partition_key: last.partition_key,
                data: last.data,
                dead_lettered: outcome.dead_lettered,
            });
        }

        Ok(count)
    }

    /// Whether the monitor should flush: a full interval without a flush and
    /// records waiting.
    fn flush_due(&self) -> bool {
        let last_flush = *self.last_flush.lock().unwrap_or_else(PoisonError::into_inner);
        last_flush.elapsed() >= self.config.batch_time && !self.queue.is_empty()
    }
}

/// Batching, retrying producer for one stream.
///
/// `M` is the type of the optional per-record metadata handed back through
/// [`FlushEvent`]; it never leaves the process.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use kinesis_producer::{DryRunClient, FlushEvent, Producer, ProducerConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let producer: Producer = Producer::builder(ProducerConfig::for_stream("clicks"))
///     .client(Arc::new(DryRunClient::new()))
///     .on_flush(|event: FlushEvent| println!("flushed {} records", event.count))
///     .build()
///     .await?;
///
/// producer.put("hello", None, None)?;
/// producer.put_many(["a", "b", "c"], Some("user-42"))?;
/// producer.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct Producer<M = serde_json::Value> {
    shared: Arc<Shared<M>>,
    pool: DispatchPool,
    liveness: CancellationToken,
    closed: AtomicBool,
    // Held for the whole shutdown so overlapping close() calls wait for it
    close_lock: tokio::sync::Mutex<()>,
}

impl<M: Send + 'static> Producer<M> {
    /// Starts building a producer for `config`.
    pub fn builder(config: ProducerConfig) -> ProducerBuilder<M> {
        ProducerBuilder::new(config)
    }

    /// Creates a producer using `client`, without a flush callback.
    ///
    /// # Errors
    ///
    /// Returns `ProducerError::Config` if the configuration is invalid.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(config: ProducerConfig, client: Arc<dyn StreamClient>) -> Result<Self, ProducerError> {
        config.validate()?;
        Ok(Self::start(config, client, None))
    }

    fn start(
        config: ProducerConfig,
        client: Arc<dyn StreamClient>,
        on_flush: Option<FlushCallback<M>>,
    ) -> Self {
        let stats = Arc::new(ProducerStats::new());
        let sender = BatchSender::new(
            client,
            config.stream_name.clone(),
            config.max_retries,
            config.request_timeout,
            DeadLetterSink::new(config.dead_letter_path.clone(), config.dead_letter_format),
            Arc::clone(&stats),
        );
        let pool = DispatchPool::new(config.threads);
        let liveness = CancellationToken::new();

        log::info!(
            "Starting producer for stream {} (batch {} records / {} bytes, interval {:?}, {} workers)",
            config.stream_name,
            config.batch_size,
            config.batch_size_bytes,
            config.batch_time,
            pool.size()
        );

        let shared = Arc::new(Shared {
            config,
            queue: BufferQueue::new(),
            sender,
            last_flush: Mutex::new(Instant::now()),
            on_flush,
            stats,
        });

        let producer = Self {
            shared,
            pool,
            liveness,
            closed: AtomicBool::new(false),
            close_lock: tokio::sync::Mutex::new(()),
        };

        let monitor = monitor::run_monitor(Arc::clone(&producer.shared), producer.liveness.clone());
        if let Err(e) = producer.pool.submit(monitor) {
            // The pool was created above and cannot be shut down yet
            log::error!("Could not start flush monitor: {}", e);
        }

        producer
    }

    /// Queues one record.
    ///
    /// `data` is encoded (bytes pass through, anything else becomes UTF-8
    /// text). Without a non-empty `partition_key` a random key is generated
    /// for this record. If the queue had already reached a batch threshold a
    /// flush is scheduled on the pool; this call never waits for it.
    ///
    /// # Errors
    ///
    /// Returns `ProducerError::Encode` if `data` cannot be encoded and
    /// `ProducerError::Closed` after [`close`](Self::close).
    pub fn put<D: IntoRecordData>(
        &self,
        data: D,
        metadata: Option<M>,
        partition_key: Option<&str>,
    ) -> Result<(), ProducerError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ProducerError::Closed);
        }

        let record = Record::new(encode_data(data)?, partition_key);
        log::debug!("Putting record \"{}\"", record.preview());

        // The queue is sealed by close() under its own lock, so a record that
        // gets in here is always seen by the final drain
        let before = self.shared.queue.push(QueuedRecord::new(record, metadata))?;
        self.shared.stats.record_enqueued();

        if before.reaches(self.shared.config.batch_size, self.shared.config.batch_size_bytes) {
            log::info!("Queue flush: batch size reached");
            self.schedule_flush();
        }
        Ok(())
    }

    /// Queues every item of `records` in order, all with `partition_key` when given.
    ///
    /// Each item is put independently; if one fails to encode, the items
    /// before it stay queued.
    ///
    /// # Returns
    ///
    /// The number of records queued.
    pub fn put_many<I>(&self, records: I, partition_key: Option<&str>) -> Result<usize, ProducerError>
    where
        I: IntoIterator,
        I::Item: IntoRecordData,
    {
        let mut queued = 0;
        for data in records {
            self.put(data, None, partition_key)?;
            queued += 1;
        }
        Ok(queued)
    }

    fn schedule_flush(&self) {
        let shared = Arc::clone(&self.shared);
        let job = async move {
            if let Err(e) = shared.flush().await {
                log::error!("Flush failed: {}", e);
            }
        };
        if let Err(e) = self.pool.submit(job) {
            log::warn!("Could not schedule flush: {}", e);
        }
    }

    /// Flushes one batch on the calling task.
    ///
    /// # Returns
    ///
    /// The number of records flushed; 0 when the queue was empty.
    ///
    /// # Errors
    ///
    /// Returns `ProducerError::DeadLetter` if records whose retries were
    /// exhausted could not be written to the dead-letter file.
    pub async fn flush(&self) -> Result<usize, ProducerError> {
        self.shared.flush().await
    }

    /// Flushes everything, stops the monitor and waits for in-flight flushes.
    ///
    /// Queued records are never dropped: the queue stops accepting records,
    /// is drained batch by batch before the pool is shut down, and once more
    /// afterwards for flushes that were scheduled but found the queue already
    /// taken. A call that overlaps a running `close` waits for it to finish
    /// and then returns `Ok(())`; later calls return immediately.
    ///
    /// A panic raised while draining (for example by the flush callback) is
    /// logged and does not interrupt the shutdown.
    ///
    /// # Errors
    ///
    /// Returns the first flush error seen while draining; shutdown still
    /// completes.
    pub async fn close(&self) -> Result<(), ProducerError> {
        let _closing = self.close_lock.lock().await;
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        log::info!("Closing producer");
        self.shared.queue.seal();

        let mut first_error = None;
        self.drain(&mut first_error).await;
        self.liveness.cancel();
        self.pool.shutdown().await;
        self.drain(&mut first_error).await;

        log::info!("Producer closed");
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn drain(&self, first_error: &mut Option<ProducerError>) {
        while !self.shared.queue.is_empty() {
            match AssertUnwindSafe(self.shared.flush()).catch_unwind().await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    log::error!("Flush during close failed: {}", e);
                    first_error.get_or_insert(e);
                }
                Err(_) => log::error!("Flush during close panicked; continuing shutdown"),
            }
        }
    }

    /// Number of queued records.
    pub fn len(&self) -> usize {
        self.shared.queue.len()
    }

    /// Whether no records are queued.
    pub fn is_empty(&self) -> bool {
        self.shared.queue.is_empty()
    }

    /// Estimated bytes of queued records.
    pub fn queued_bytes(&self) -> usize {
        self.shared.queue.size_bytes()
    }

    /// Point-in-time copy of the producer counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// The validated configuration this producer runs with.
    pub fn config(&self) -> &ProducerConfig {
        &self.shared.config
    }

    /// Path of the dead-letter file for exhausted records.
    pub fn dead_letter_path(&self) -> &Path {
        self.shared.sender.dead_letter().path()
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl<M> Drop for Producer<M> {
    fn drop(&mut self) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        self.liveness.cancel();
        let level = self.shared.queue.level();
        if level.len > 0 {
            log::warn!(
                "Producer for {} dropped without close(); {} queued records ({} bytes) were not sent",
                self.shared.config.stream_name,
                level.len,
                level.size_bytes
            );
        }
    }
}
