// Deferred AI work: a job runs on its own thread after a "thinking" delay and
// posts its result back over a channel. Cancelling interrupts the delay and
// raises the stop flag the job was handed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, after, bounded, select};
use tracing::{debug, warn};

/// Result of a job that ran to completion, tagged with the game generation
/// it was scheduled for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed<T> {
    pub generation: u64,
    pub value: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll<T> {
    Pending,
    Ready(T),
    /// Cancelled, or the worker exited without a result.
    Gone,
}

pub struct PendingJob<T> {
    generation: u64,
    stop: Arc<AtomicBool>,
    cancel_tx: Option<Sender<()>>,
    result_rx: Receiver<Completed<T>>,
    handle: Option<JoinHandle<()>>,
}

/// Runs `job` on a worker thread once `delay` has elapsed.
pub fn schedule<T, F>(generation: u64, delay: Duration, job: F) -> PendingJob<T>
where
    T: Send + 'static,
    F: FnOnce(Arc<AtomicBool>) -> T + Send + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let (cancel_tx, cancel_rx) = bounded::<()>(1);
    let (result_tx, result_rx) = bounded::<Completed<T>>(1);

    let worker_stop = Arc::clone(&stop);
    let handle = thread::spawn(move || {
        select! {
            recv(cancel_rx) -> _ => {
                debug!(generation, "job cancelled during delay");
                return;
            }
            recv(after(delay)) -> _ => {}
        }
        if worker_stop.load(Ordering::Relaxed) {
            return;
        }

        let value = job(Arc::clone(&worker_stop));
        if worker_stop.load(Ordering::Relaxed) {
            debug!(generation, "job finished after cancellation, result dropped");
            return;
        }
        // Receiver gone means nobody is waiting any more.
        let _ = result_tx.send(Completed { generation, value });
    });

    PendingJob {
        generation,
        stop,
        cancel_tx: Some(cancel_tx),
        result_rx,
        handle: Some(handle),
    }
}

impl<T> PendingJob<T> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Non-blocking check for the result.
    pub fn poll(&self) -> Poll<Completed<T>> {
        match self.result_rx.try_recv() {
            Ok(done) => Poll::Ready(done),
            Err(TryRecvError::Empty) => Poll::Pending,
            Err(TryRecvError::Disconnected) => Poll::Gone,
        }
    }

    pub fn wait_timeout(&self, timeout: Duration) -> Poll<Completed<T>> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(done) => Poll::Ready(done),
            Err(RecvTimeoutError::Timeout) => Poll::Pending,
            Err(RecvTimeoutError::Disconnected) => Poll::Gone,
        }
    }

    /// Blocks until the job finishes. `None` if it was cancelled.
    pub fn wait(mut self) -> Option<Completed<T>> {
        let result = self.result_rx.recv().ok();
        self.join();
        result
    }

    pub fn cancel(&mut self) {
        if self.handle.is_none() {
            return;
        }
        self.stop.store(true, Ordering::Relaxed);
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.try_send(());
        }
        debug!(generation = self.generation, "cancelling pending job");
        self.join();
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!(generation = self.generation, "ai worker panicked");
            }
        }
    }
}

impl<T> Drop for PendingJob<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}
