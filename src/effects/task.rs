//! Non-failing asynchronous tasks.
//!
//! A [`Task`] describes work without doing it. Running a task creates a fresh
//! future each time, so the same task (and every effect holding one) can be
//! cloned, stored, and performed repeatedly. There is no error channel: work
//! that can fail must fold its failure into the output type before it becomes
//! a task.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use super::address::Address;
use crate::error::{self, Result};
use crate::message::Message;

type Thunk<T> = Arc<dyn Fn() -> BoxFuture<'static, T> + Send + Sync>;

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A lazy, repeatable unit of work that eventually produces a `T` and never fails.
pub struct Task<T> {
    thunk: Thunk<T>,
}

impl<T> Clone for Task<T> {
    fn clone(&self) -> Self {
        Self {
            thunk: Arc::clone(&self.thunk),
        }
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Task(<future>)")
    }
}

impl<T: Send + 'static> Task<T> {
    /// Wrap a future factory. The factory is called once per run.
    pub fn future<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        Self {
            thunk: Arc::new(move || f().boxed()),
        }
    }

    /// A task that completes immediately with `value`.
    pub fn succeed(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::future(move || future::ready(value.clone()))
    }

    /// Callback-style task: `f` is handed a [`Deliver`] and the task completes
    /// when it is resolved.
    ///
    /// If the deliverer is dropped unresolved the task stays pending forever.
    pub fn io<F>(f: F) -> Self
    where
        F: Fn(Deliver<T>) + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Self::future(move || {
            let f = Arc::clone(&f);
            async move {
                let (sender, receiver) = oneshot::channel();
                f(Deliver { sender });
                match receiver.await {
                    Ok(value) => value,
                    Err(_) => {
                        warn!("io task deliverer dropped without a value, task stays pending");
                        future::pending().await
                    }
                }
            }
        })
    }

    /// Transform the eventual output.
    pub fn map<U, F>(&self, f: F) -> Task<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let thunk = Arc::clone(&self.thunk);
        let f = Arc::new(f);
        Task::future(move || {
            let run = thunk();
            let f = Arc::clone(&f);
            async move { f(run.await) }
        })
    }

    /// Run `f` on the output and continue with the task it returns.
    pub fn chain<U, F>(&self, f: F) -> Task<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Task<U> + Send + Sync + 'static,
    {
        let thunk = Arc::clone(&self.thunk);
        let f = Arc::new(f);
        Task::future(move || {
            let run = thunk();
            let f = Arc::clone(&f);
            async move {
                let next = f(run.await);
                next.run().await
            }
        })
    }

    /// Create a future for one execution of this task.
    pub fn run(&self) -> BoxFuture<'static, T> {
        (self.thunk)()
    }

    /// Spawn one execution on the current tokio runtime.
    pub fn perform(&self) -> Result<JoinHandle<T>> {
        let handle = error::runtime("perform a task")?;
        Ok(handle.spawn(self.run()))
    }
}

// ---------------------------------------------------------------------------
// Deliver
// ---------------------------------------------------------------------------

/// One-shot completion handle passed to [`Task::io`] callbacks.
pub struct Deliver<T> {
    sender: oneshot::Sender<T>,
}

impl<T> Deliver<T> {
    /// Complete the task with `value`.
    pub fn resolve(self, value: T) {
        if self.sender.send(value).is_err() {
            trace!("io task was dropped before its value arrived");
        }
    }
}

impl<T> fmt::Debug for Deliver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deliver")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// send
// ---------------------------------------------------------------------------

/// A task that delivers `value` to `address` when run.
pub fn send<A: Message>(address: &Address<A>, value: A) -> Task<()> {
    let address = address.clone();
    Task::future(move || {
        let address = address.clone();
        let value = value.clone();
        async move { address.deliver(value) }
    })
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio_test::{assert_pending, assert_ready_eq, block_on};

    #[test]
    fn succeed_yields_value() {
        let task = Task::succeed(5_i32);
        assert_eq!(block_on(task.run()), 5);
    }

    #[test]
    fn tasks_are_repeatable() {
        let task = Task::succeed(String::from("again"));
        assert_eq!(block_on(task.run()), "again");
        assert_eq!(block_on(task.run()), "again");
    }

    #[test]
    fn map_transforms_output() {
        let task = Task::succeed(3_i32).map(|n| n * 10).map(|n| n.to_string());
        assert_eq!(block_on(task.run()), "30");
    }

    #[test]
    fn map_is_lazy() {
        let runs = Arc::new(AtomicUsize::new(0));
        let runs_c = Arc::clone(&runs);
        let task = Task::future(move || {
            runs_c.fetch_add(1, Ordering::SeqCst);
            future::ready(1_u8)
        });
        let mapped = task.map(|n| n + 1);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(block_on(mapped.run()), 2);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn chain_sequences_tasks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first_log = Arc::clone(&log);
        let first = Task::future(move || {
            first_log.lock().unwrap().push("first");
            future::ready(2_i32)
        });
        let second_log = Arc::clone(&log);
        let chained = first.chain(move |n| {
            let second_log = Arc::clone(&second_log);
            Task::future(move || {
                second_log.lock().unwrap().push("second");
                future::ready(n * 4)
            })
        });
        assert_eq!(block_on(chained.run()), 8);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn io_completes_on_resolve() {
        let task = Task::io(|deliver: Deliver<&'static str>| deliver.resolve("done"));
        assert_eq!(block_on(task.run()), "done");
    }

    #[test]
    fn io_waits_for_deliverer() {
        let slot: Arc<Mutex<Option<Deliver<u32>>>> = Arc::new(Mutex::new(None));
        let slot_c = Arc::clone(&slot);
        let task = Task::io(move |deliver| {
            *slot_c.lock().unwrap() = Some(deliver);
        });
        let mut run = tokio_test::task::spawn(task.run());
        assert_pending!(run.poll());

        let deliver = slot.lock().unwrap().take().unwrap();
        deliver.resolve(42);
        assert!(run.is_woken());
        assert_ready_eq!(run.poll(), 42);
    }

    #[test]
    fn io_dropped_deliverer_stays_pending() {
        let task = Task::io(|deliver: Deliver<u32>| drop(deliver));
        let mut run = tokio_test::task::spawn(task.run());
        assert_pending!(run.poll());
        assert_pending!(run.poll());
    }

    #[test]
    fn perform_without_runtime_errors() {
        let err = Task::succeed(()).perform().unwrap_err();
        assert!(matches!(err, crate::error::Error::NoRuntime { .. }));
    }

    #[tokio::test]
    async fn perform_spawns_on_runtime() {
        let handle = Task::succeed(9_u8).map(|n| n * 2).perform().unwrap();
        assert_eq!(handle.await.unwrap(), 18);
    }

    #[test]
    fn send_delivers_to_address() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let received_c = Arc::clone(&received);
        let address = Address::new(move |n: i32| received_c.lock().unwrap().push(n));

        let task = send(&address, 7);
        assert!(received.lock().unwrap().is_empty());
        block_on(task.run());
        block_on(task.run());
        assert_eq!(*received.lock().unwrap(), vec![7, 7]);
    }

    #[test]
    fn debug_format() {
        let task = Task::succeed(1_u8);
        assert_eq!(format!("{:?}", task), "Task(<future>)");
    }
}
