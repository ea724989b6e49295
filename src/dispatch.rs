//! Dispatch pool.
//!
//! A fixed number of Tokio worker tasks pull boxed jobs off an unbounded
//! channel. Submitting never waits: callers on the enqueue path hand a flush
//! to the pool and return immediately. The producer's monitor runs here too
//! and keeps one worker busy for the producer's whole lifetime.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error_handling::ProducerError;

/// Unit of work executed by a pool worker.
pub type Job = BoxFuture<'static, ()>;

type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Job>>>;

/// Bounded set of workers executing submitted jobs concurrently.
pub struct DispatchPool {
    sender: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    size: usize,
}

impl DispatchPool {
    /// Spawns `size` workers on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(size: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel::<Job>();
        let receiver: SharedReceiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let workers = (0..size)
            .map(|id| tokio::spawn(worker_loop(id, Arc::clone(&receiver))))
            .collect();

        Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            size,
        }
    }

    /// Number of workers.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Queues `job` for execution without waiting for a free worker.
    ///
    /// # Errors
    ///
    /// Returns `ProducerError::Closed` once [`shutdown`](Self::shutdown) has started.
    pub fn submit<F>(&self, job: F) -> Result<(), ProducerError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match sender.as_ref() {
            Some(sender) => sender.send(job.boxed()).map_err(|_| ProducerError::Closed),
            None => Err(ProducerError::Closed),
        }
    }

    /// Stops accepting jobs and waits until every queued and running job has finished.
    ///
    /// Calling it again after it returned is a no-op.
    pub async fn shutdown(&self) {
        // Dropping the only sender closes the channel; workers exit once it is drained
        drop(
            self.sender
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );

        let workers: Vec<JoinHandle<()>> = self
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();

        for worker in workers {
            if let Err(e) = worker.await {
                log::error!("Dispatch worker terminated abnormally: {}", e);
            }
        }
    }
}

async fn worker_loop(id: usize, receiver: SharedReceiver) {
    loop {
        // Release the receiver lock before running the job so other workers can pick up work
        let job = receiver.lock().await.recv().await;
        let Some(job) = job else {
            log::trace!("Dispatch worker {} exiting", id);
            break;
        };

        if AssertUnwindSafe(job).catch_unwind().await.is_err() {
            log::error!("Job panicked on dispatch worker {}; worker continues", id);
        }
    }
}
