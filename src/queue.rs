//! Buffer queue shared between callers and flush workers.
//!
//! An unbounded FIFO of [`QueuedRecord`]s plus a running byte estimate. Both
//! live behind one mutex so every push and drain sees and updates them
//! together; the lock is never held across an `.await`.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error_handling::ProducerError;
use crate::record::QueuedRecord;

/// Queue length and byte estimate at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueLevel {
    /// Number of queued records
    pub len: usize,
    /// Sum of the size estimates of queued records
    pub size_bytes: usize,
}

impl QueueLevel {
    /// Returns `true` when either batch threshold has been reached.
    pub fn reaches(&self, max_count: usize, max_bytes: usize) -> bool {
        self.len >= max_count || self.size_bytes >= max_bytes
    }
}

struct QueueState<M> {
    records: VecDeque<QueuedRecord<M>>,
    size_bytes: usize,
    sealed: bool,
}

/// Thread-safe FIFO of records awaiting a flush.
pub struct BufferQueue<M> {
    state: Mutex<QueueState<M>>,
}

impl<M> Default for BufferQueue<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> BufferQueue<M> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                records: VecDeque::new(),
                size_bytes: 0,
                sealed: false,
            }),
        }
    }

    // Every critical section leaves the state consistent, so a panic elsewhere
    // while the lock was held cannot corrupt it.
    fn lock(&self) -> MutexGuard<'_, QueueState<M>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `entry` at the tail.
    ///
    /// # Returns
    ///
    /// The queue level observed just before the append, so the caller can
    /// decide on a flush from the same atomic view it modified.
    ///
    /// # Errors
    ///
    /// Returns `ProducerError::Closed` once the queue is [sealed](Self::seal);
    /// the entry is dropped.
    pub fn push(&self, entry: QueuedRecord<M>) -> Result<QueueLevel, ProducerError> {
        let mut state = self.lock();
        if state.sealed {
            return Err(ProducerError::Closed);
        }
        let before = QueueLevel {
            len: state.records.len(),
            size_bytes: state.size_bytes,
        };
        state.size_bytes += entry.size_bytes;
        state.records.push_back(entry);
        Ok(before)
    }

    /// Rejects every later push. Records already queued stay drainable.
    ///
    /// A push either lands before the seal, and is seen by the drain that
    /// follows it, or fails.
    pub fn seal(&self) {
        self.lock().sealed = true;
    }

    /// Removes one batch from the head of the queue.
    ///
    /// Takes at most `max_count` records and stops before a record that would
    /// push the batch past `max_bytes`. The first record is always taken, so a
    /// record larger than `max_bytes` still leaves the queue on its own.
    pub fn drain_batch(&self, max_count: usize, max_bytes: usize) -> Vec<QueuedRecord<M>> {
        let mut state = self.lock();
        let mut batch = Vec::new();
        let mut batch_bytes = 0usize;

        while batch.len() < max_count {
            let Some(next_size) = state.records.front().map(|entry| entry.size_bytes) else {
                break;
            };
            if !batch.is_empty() && batch_bytes + next_size > max_bytes {
                break;
            }
            if let Some(entry) = state.records.pop_front() {
                batch_bytes += next_size;
                batch.push(entry);
            }
        }

        state.size_bytes -= batch_bytes;
        batch
    }

    /// Current length and byte estimate.
    pub fn level(&self) -> QueueLevel {
        let state = self.lock();
        QueueLevel {
            len: state.records.len(),
            size_bytes: state.size_bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    pub fn size_bytes(&self) -> usize {
        self.lock().size_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use std::sync::Arc;

    fn entry(data: &[u8]) -> QueuedRecord<usize> {
        QueuedRecord::new(Record::new(data.to_vec(), Some("k")), None)
    }

    fn entry_with(index: usize) -> QueuedRecord<usize> {
        QueuedRecord::new(
            Record::new(index.to_string().into_bytes(), Some("k")),
            Some(index),
        )
    }

    #[test]
    fn test_push_reports_level_before_append() {
        let queue = BufferQueue::new();
        let first = queue.push(entry(b"aaaa")).expect("open");
        assert_eq!(first, QueueLevel { len: 0, size_bytes: 0 });

        let size = entry(b"aaaa").size_bytes;
        let second = queue.push(entry(b"aaaa")).expect("open");
        assert_eq!(second, QueueLevel { len: 1, size_bytes: size });
        assert_eq!(queue.level(), QueueLevel { len: 2, size_bytes: 2 * size });
    }

    #[test]
    fn test_drain_is_fifo_and_capped_by_count() {
        let queue = BufferQueue::new();
        for i in 0..10 {
            queue.push(entry_with(i)).expect("open");
        }

        let batch = queue.drain_batch(4, usize::MAX);
        let order: Vec<usize> = batch.iter().filter_map(|e| e.metadata).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert_eq!(queue.len(), 6);

        let rest = queue.drain_batch(100, usize::MAX);
        let order: Vec<usize> = rest.iter().filter_map(|e| e.metadata).collect();
        assert_eq!(order, vec![4, 5, 6, 7, 8, 9]);
        assert!(queue.is_empty());
        assert_eq!(queue.size_bytes(), 0);
    }

    #[test]
    fn test_drain_stops_before_exceeding_byte_cap() {
        let queue = BufferQueue::new();
        for _ in 0..5 {
            queue.push(entry(&[0u8; 84])).expect("open"); // 84 + 1 + 16 = 101 bytes each
        }
        let batch = queue.drain_batch(100, 250);
        assert_eq!(batch.len(), 2);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.size_bytes(), 3 * 101);
    }

    #[test]
    fn test_drain_always_takes_an_oversized_head() {
        let queue = BufferQueue::new();
        queue.push(entry(&[0u8; 1000])).expect("open");
        queue.push(entry(b"small")).expect("open");

        let batch = queue.drain_batch(100, 10);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].record.data.len(), 1000);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_drain_empty_queue() {
        let queue: BufferQueue<()> = BufferQueue::new();
        assert!(queue.drain_batch(10, 10).is_empty());
        assert_eq!(queue.size_bytes(), 0);
    }

    #[test]
    fn test_sealed_queue_rejects_pushes_but_keeps_records() {
        let queue = BufferQueue::new();
        queue.push(entry_with(1)).expect("open");
        queue.seal();

        assert!(matches!(queue.push(entry_with(2)), Err(ProducerError::Closed)));
        assert_eq!(queue.len(), 1);

        let batch = queue.drain_batch(10, usize::MAX);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].metadata, Some(1));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_level_reaches_thresholds() {
        let level = QueueLevel { len: 5, size_bytes: 100 };
        assert!(level.reaches(5, 1000));
        assert!(level.reaches(50, 100));
        assert!(!level.reaches(6, 101));
    }

    #[test]
    fn test_concurrent_push_and_drain_keep_counter_consistent() {
        let queue = Arc::new(BufferQueue::new());
        let producers: Vec<_> = (0..4)
            .map(|t| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    for i in 0..500 {
                        queue.push(entry_with(t * 1000 + i)).expect("open");
                    }
                })
            })
            .collect();

        let drainer = {
            let queue = Arc::clone(&queue);
            std::thread::spawn(move || {
                let mut drained = 0;
                for _ in 0..200 {
                    drained += queue.drain_batch(7, usize::MAX).len();
                    std::thread::yield_now();
                }
                drained
            })
        };

        for handle in producers {
            handle.join().expect("producer thread panicked");
        }
        let drained = drainer.join().expect("drainer thread panicked");
        let remaining = queue.drain_batch(usize::MAX, usize::MAX);

        assert_eq!(drained + remaining.len(), 2000);
        assert_eq!(queue.size_bytes(), 0);
        assert!(queue.is_empty());
    }
}
