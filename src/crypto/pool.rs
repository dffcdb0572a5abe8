//! Bounded worker pool for CPU-bound crypto jobs.
//!
//! A high-iteration key derivation takes long enough to stall an
//! interactive caller, so the engine offers dispatch onto a small fixed
//! pool of worker threads.  Jobs are plain closures with no suspension
//! points; results come back through a one-shot channel via
//! `JobHandle::wait`.  Dropping the pool closes the channel and joins
//! every worker.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::errors::{Result, SecurityError};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool of worker threads.
pub struct CryptoPool {
    sender: Option<mpsc::Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl CryptoPool {
    /// Spawn a pool with `threads` workers (at least one).
    pub fn new(threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = Vec::with_capacity(threads);
        for i in 0..threads {
            let receiver = Arc::clone(&receiver);
            let handle = thread::Builder::new()
                .name(format!("docvault-crypto-{i}"))
                .spawn(move || loop {
                    // The lock is held only while waiting for a job, so
                    // received jobs run in parallel across workers.
                    let job = match receiver.lock() {
                        Ok(rx) => rx.recv(),
                        Err(_) => break,
                    };
                    match job {
                        Ok(job) => job(),
                        Err(_) => break, // channel closed — pool is shutting down
                    }
                })
                .map_err(|e| SecurityError::System(format!("failed to spawn crypto worker: {e}")))?;
            workers.push(handle);
        }

        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Dispatch `job` onto the pool, returning a handle to wait on.
    pub fn execute<T, F>(&self, job: F) -> JobHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let boxed: Job = Box::new(move || {
            let _ = tx.send(job());
        });

        if let Some(sender) = &self.sender {
            // A send error means the pool is shutting down; the handle
            // reports it when waited on.
            let _ = sender.send(boxed);
        }

        JobHandle { receiver: rx }
    }
}

impl Drop for CryptoPool {
    fn drop(&mut self) {
        self.sender.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

/// Handle to a job dispatched onto a `CryptoPool`.
pub struct JobHandle<T> {
    receiver: mpsc::Receiver<Result<T>>,
}

impl<T> JobHandle<T> {
    /// Block until the job finishes and return its result.
    pub fn wait(self) -> Result<T> {
        self.receiver.recv().map_err(|_| {
            SecurityError::System("crypto worker exited before returning a result".into())
        })?
    }
}
