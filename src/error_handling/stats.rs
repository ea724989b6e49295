//! Producer statistics tracking.
//!
//! This module provides thread-safe counters for what happened to records
//! after they were handed to the producer.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

/// Thread-safe producer statistics tracker.
///
/// Every counter is an atomic, so the tracker can be shared across the
/// enqueue path and all dispatch workers without locking.
#[derive(Debug, Default)]
pub struct ProducerStats {
    records_enqueued: AtomicUsize,
    records_sent: AtomicUsize,
    records_retried: AtomicUsize,
    records_dead_lettered: AtomicUsize,
    batches_flushed: AtomicUsize,
    send_attempts: AtomicUsize,
    send_errors: AtomicUsize,
}

/// Point-in-time copy of [`ProducerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Records accepted by `put`/`put_many`
    pub records_enqueued: usize,
    /// Records the stream service acknowledged
    pub records_sent: usize,
    /// Records that were resent after a failure (counted once per resend)
    pub records_retried: usize,
    /// Records written to the dead-letter file
    pub records_dead_lettered: usize,
    /// Non-empty batches drained from the queue
    pub batches_flushed: usize,
    /// Calls made to the stream service
    pub send_attempts: usize,
    /// Calls that failed outright (transport error or timeout)
    pub send_errors: usize,
}

impl ProducerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_enqueued(&self) {
        self.records_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sent(&self, count: usize) {
        self.records_sent.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_retried(&self, count: usize) {
        self.records_retried.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_dead_lettered(&self, count: usize) {
        self.records_dead_lettered.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_batch(&self) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_attempt(&self) {
        self.send_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_send_error(&self) {
        self.send_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Takes a snapshot of all counters.
    ///
    /// Counters are read individually, so a snapshot taken while flushes are
    /// in flight may be slightly inconsistent across fields.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            records_enqueued: self.records_enqueued.load(Ordering::Relaxed),
            records_sent: self.records_sent.load(Ordering::Relaxed),
            records_retried: self.records_retried.load(Ordering::Relaxed),
            records_dead_lettered: self.records_dead_lettered.load(Ordering::Relaxed),
            batches_flushed: self.batches_flushed.load(Ordering::Relaxed),
            send_attempts: self.send_attempts.load(Ordering::Relaxed),
            send_errors: self.send_errors.load(Ordering::Relaxed),
        }
    }
}
