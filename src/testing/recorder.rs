//! Stream recording for assertions.
//!
//! A [`Recorder`] drains a stream on the tokio runtime into a shared buffer so
//! tests can wait until a number of events has arrived, then inspect them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::error::{self, Result};

/// How long [`Recorder::wait_for`] waits before giving up.
pub const WAIT_LIMIT: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Recorder
// ---------------------------------------------------------------------------

/// Collects every item of a stream in arrival order.
///
/// The draining task is aborted when the recorder is dropped.
#[derive(Debug)]
pub struct Recorder<T> {
    seen: Arc<Mutex<Vec<T>>>,
    arrived: Arc<Notify>,
    drain: JoinHandle<()>,
}

impl<T: Clone + Send + 'static> Recorder<T> {
    /// Start draining `stream` on the current runtime.
    pub fn spawn(stream: impl Stream<Item = T> + Send + 'static) -> Result<Self> {
        let handle = error::runtime("record a stream")?;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let arrived = Arc::new(Notify::new());

        let sink = Arc::clone(&seen);
        let signal = Arc::clone(&arrived);
        let drain = handle.spawn(async move {
            let mut stream = Box::pin(stream);
            while let Some(item) = stream.next().await {
                lock(&sink).push(item);
                signal.notify_one();
            }
        });

        Ok(Self {
            seen,
            arrived,
            drain,
        })
    }

    /// Everything recorded so far.
    pub fn values(&self) -> Vec<T> {
        lock(&self.seen).clone()
    }

    /// Number of items recorded so far.
    pub fn len(&self) -> usize {
        lock(&self.seen).len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the recorded stream has ended.
    pub fn is_finished(&self) -> bool {
        self.drain.is_finished()
    }

    /// Wait until at least `count` items arrived (or [`WAIT_LIMIT`] passed),
    /// then return everything recorded.
    pub async fn wait_for(&self, count: usize) -> Vec<T> {
        let deadline = tokio::time::Instant::now() + WAIT_LIMIT;
        loop {
            {
                let seen = lock(&self.seen);
                if seen.len() >= count {
                    return seen.clone();
                }
            }
            if tokio::time::timeout_at(deadline, self.arrived.notified())
                .await
                .is_err()
            {
                return self.values();
            }
        }
    }

    /// Let the runtime run for `duration`, then return everything recorded.
    ///
    /// Used to assert that nothing (more) arrives.
    pub async fn settle(&self, duration: Duration) -> Vec<T> {
        tokio::time::sleep(duration).await;
        self.values()
    }
}

impl<T> Drop for Recorder<T> {
    fn drop(&mut self) {
        self.drain.abort();
    }
}

fn lock<T>(seen: &Mutex<Vec<T>>) -> MutexGuard<'_, Vec<T>> {
    seen.lock().unwrap_or_else(PoisonError::into_inner)
}

// ===========================================================================
// Tests
// ===========================================================================
