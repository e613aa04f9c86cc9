//! Delivery capabilities for effect results.
//!
//! An [`Address`] is handed to [`Effect::send`](super::Effect::send) by the
//! runtime. Effects never see the handler behind it, only the ability to
//! deliver a value to it.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{trace, warn};

use super::task::{self, Task};
use crate::message::Message;

/// Opaque, cloneable target for values of type `A`.
pub struct Address<A> {
    deliver: Arc<dyn Fn(A) + Send + Sync>,
}

impl<A> Clone for Address<A> {
    fn clone(&self) -> Self {
        Self {
            deliver: Arc::clone(&self.deliver),
        }
    }
}

impl<A> fmt::Debug for Address<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Address")
            .field("handlers", &Arc::strong_count(&self.deliver))
            .finish()
    }
}

impl<A: 'static> Address<A> {
    /// Create an address from a handler closure.
    pub fn new(handler: impl Fn(A) + Send + Sync + 'static) -> Self {
        Self {
            deliver: Arc::new(handler),
        }
    }

    /// Create an address that forwards into a tokio channel.
    ///
    /// Values sent after the receiver is gone are dropped with a warning.
    pub fn from_sender(sender: mpsc::UnboundedSender<A>) -> Self
    where
        A: Send,
    {
        Self::new(move |value| {
            if sender.send(value).is_err() {
                warn!("address receiver closed, dropping message");
            }
        })
    }

    /// Hand `value` to the handler immediately.
    pub fn deliver(&self, value: A) {
        (self.deliver)(value)
    }

    /// Adapt this address to accept `B`s, converting each through `f`.
    pub fn forward<B: 'static>(&self, f: impl Fn(B) -> A + Send + Sync + 'static) -> Address<B> {
        let target = self.clone();
        Address::new(move |value| target.deliver(f(value)))
    }
}

impl<A: Message> Address<A> {
    /// A task that delivers `value` here when run.
    pub fn send(&self, value: A) -> Task<()> {
        trace!(message = value.message_name(), "queueing delivery");
        task::send(self, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn deliver_calls_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_c = Arc::clone(&seen);
        let address = Address::new(move |s: &'static str| seen_c.lock().unwrap().push(s));
        address.deliver("a");
        address.clone().deliver("b");
        assert_eq!(*seen.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn forward_adapts_values() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_c = Arc::clone(&seen);
        let address = Address::new(move |s: String| seen_c.lock().unwrap().push(s));
        let numbers: Address<u32> = address.forward(|n: u32| format!("#{n}"));
        numbers.deliver(3);
        assert_eq!(*seen.lock().unwrap(), vec!["#3".to_string()]);
    }

    #[test]
    fn from_sender_pushes_into_channel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let address = Address::from_sender(tx);
        address.deliver(1_u8);
        address.deliver(2_u8);
        assert_eq!(rx.try_recv().unwrap(), 1);
        assert_eq!(rx.try_recv().unwrap(), 2);
    }

    #[test]
    fn from_sender_closed_receiver_does_not_panic() {
        let (tx, rx) = mpsc::unbounded_channel::<u8>();
        drop(rx);
        Address::from_sender(tx).deliver(1);
    }

    #[test]
    fn send_is_deferred_until_run() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let address = Address::from_sender(tx);
        let task = address.send(10_i32);
        assert!(rx.try_recv().is_err());
        tokio_test::block_on(task.run());
        assert_eq!(rx.try_recv().unwrap(), 10);
    }
}
