//! Send/retry engine.
//!
//! Sends one drained batch to the stream service and reconciles partial
//! failures: only the records the service rejected are resent, after an
//! exponential backoff, until the retry ceiling is reached. Whatever still
//! fails after the last attempt goes to the dead-letter sink.

use std::sync::Arc;
use std::time::Duration;

use crate::client::{PutRecordsOutput, StreamClient};
use crate::dead_letter::DeadLetterSink;
use crate::error_handling::{get_retry_strategy, ClientError, ProducerError, ProducerStats};
use crate::record::Record;

/// What happened to one batch handed to [`BatchSender::send`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOutcome {
    /// Records the service accepted, across all attempts
    pub sent: usize,
    /// Records written to the dead-letter sink
    pub dead_lettered: usize,
    /// Calls made to the service
    pub attempts: usize,
}

/// Sends batches to one stream with retries and dead-letter fallback.
pub struct BatchSender {
    client: Arc<dyn StreamClient>,
    stream_name: String,
    max_retries: usize,
    request_timeout: Option<Duration>,
    dead_letter: DeadLetterSink,
    stats: Arc<ProducerStats>,
}

impl BatchSender {
    pub fn new(
        client: Arc<dyn StreamClient>,
        stream_name: impl Into<String>,
        max_retries: usize,
        request_timeout: Option<Duration>,
        dead_letter: DeadLetterSink,
        stats: Arc<ProducerStats>,
    ) -> Self {
        Self {
            client,
            stream_name: stream_name.into(),
            max_retries,
            request_timeout,
            dead_letter,
            stats,
        }
    }

    pub fn dead_letter(&self) -> &DeadLetterSink {
        &self.dead_letter
    }

    /// Sends `records`, resending failed ones until they succeed or the
    /// retry ceiling is hit.
    ///
    /// Attempt 0 is sent immediately. Attempt `k > 0` waits `0.1 * 2^k`
    /// seconds first and carries only the records that failed attempt `k - 1`,
    /// in their original order. After attempt `max_retries` the remaining
    /// failures are dead-lettered, so at most `max_retries + 1` calls are made.
    ///
    /// A transport error, a timed-out call or a response whose length does not
    /// match the request fails every record of that attempt.
    ///
    /// # Errors
    ///
    /// Only a failed dead-letter write is returned; delivery failures are
    /// resolved here.
    pub async fn send(&self, records: Vec<Record>) -> Result<SendOutcome, ProducerError> {
        let mut outcome = SendOutcome::default();
        if records.is_empty() {
            return Ok(outcome);
        }

        let mut pending = records;
        let mut delays = get_retry_strategy(self.max_retries);
        let mut attempt = 0usize;

        loop {
            outcome.attempts += 1;
            self.stats.record_attempt();
            let pending_len = pending.len();

            let result = self.put_once(&pending).await;
            let failed = match result {
                Ok(output) if output.failed_record_count == 0 => Vec::new(),
                Ok(output) if output.records.len() != pending_len => {
                    log::warn!(
                        "Stream {} returned {} results for {} records; treating all as failed",
                        self.stream_name,
                        output.records.len(),
                        pending_len
                    );
                    pending
                }
                Ok(output) => retain_failed(pending, &output),
                Err(e) => {
                    log::warn!(
                        "PutRecords to {} failed for {} records: {}",
                        self.stream_name,
                        pending_len,
                        e
                    );
                    self.stats.record_send_error();
                    pending
                }
            };

            let accepted = pending_len - failed.len();
            outcome.sent += accepted;
            self.stats.record_sent(accepted);

            if failed.is_empty() {
                return Ok(outcome);
            }

            attempt += 1;
            match delays.next() {
                Some(delay) => {
                    log::warn!(
                        "Retrying {} failed records (attempt {}/{}) after {:?}",
                        failed.len(),
                        attempt,
                        self.max_retries,
                        delay
                    );
                    self.stats.record_retried(failed.len());
                    tokio::time::sleep(delay).await;
                    pending = failed;
                }
                None => {
                    log::warn!(
                        "Writing {} records to {} after {} attempts",
                        failed.len(),
                        self.dead_letter.path().display(),
                        outcome.attempts
                    );
                    self.dead_letter.write_records(&failed).await?;
                    self.stats.record_dead_lettered(failed.len());
                    outcome.dead_lettered = failed.len();
                    return Ok(outcome);
                }
            }
        }
    }

    async fn put_once(&self, records: &[Record]) -> Result<PutRecordsOutput, ClientError> {
        let call = self.client.put_records(&self.stream_name, records);
        match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| ClientError::Timeout(limit))?,
            None => call.await,
        }
    }
}

/// Keeps the records whose result entry carries an error code, preserving order.
pub fn retain_failed(records: Vec<Record>, output: &PutRecordsOutput) -> Vec<Record> {
    records
        .into_iter()
        .zip(output.records.iter())
        .filter(|(_, result)| result.is_failed())
        .map(|(record, _)| record)
        .collect()
}
