//! Event streams, multicast channels and feeds.
//!
//! - [`EventStream`] — a boxed stream of JSON events, consumed once.
//! - [`Channel`] — a multicast sink; every subscriber sees every event sent
//!   after it subscribed, in send order, with nothing dropped.
//! - [`Feed`] — a cloneable source that can be subscribed any number of times.
//!   Derived feeds ([`Feed::filter`], [`Feed::map`]) re-subscribe upstream for
//!   each subscription.
//! - [`flatten`] and [`pipe`] — merge streams, forward a stream into a channel.
//!
//! Subscriptions are taken when `subscribe` is called, not when the stream is
//! first polled, so nothing sent after wiring is missed.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, trace};

use crate::error::{self, Result};

/// A stream of state-change or input events.
pub type EventStream = BoxStream<'static, Value>;

type Subscribers = Vec<mpsc::UnboundedSender<Value>>;

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// Multicast sink/source for events.
///
/// Every subscriber has its own unbounded queue, so a slow subscriber delays
/// only itself and never loses events. Subscribers whose stream was dropped
/// are pruned on the next send.
#[derive(Clone, Default)]
pub struct Channel {
    subscribers: Arc<Mutex<Subscribers>>,
}

impl Channel {
    /// Create a channel with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an event to every current subscriber. Returns how many received it.
    pub fn send(&self, event: Value) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|subscriber| subscriber.send(event.clone()).is_ok());
        if subscribers.is_empty() {
            trace!("event sent with no subscribers");
        }
        subscribers.len()
    }

    /// Subscribe to events sent from now on.
    pub fn subscribe(&self) -> EventStream {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.lock().push(sender);
        UnboundedReceiverStream::new(receiver).boxed()
    }

    /// A feed whose every subscription is a fresh channel subscription.
    pub fn feed(&self) -> Feed {
        let channel = self.clone();
        Feed::new(move || channel.subscribe())
    }

    /// Number of live subscriptions.
    pub fn receiver_count(&self) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|subscriber| !subscriber.is_closed());
        subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("receivers", &self.receiver_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

/// A multicast event source.
#[derive(Clone)]
pub struct Feed {
    source: Arc<dyn Fn() -> EventStream + Send + Sync>,
}

impl Feed {
    /// Create a feed from a subscription function.
    pub fn new(subscribe: impl Fn() -> EventStream + Send + Sync + 'static) -> Self {
        Self {
            source: Arc::new(subscribe),
        }
    }

    /// A feed replaying `values` to each subscriber, then ending.
    pub fn from_values(values: Vec<Value>) -> Self {
        Self::new(move || stream::iter(values.clone()).boxed())
    }

    /// A feed that never yields.
    pub fn empty() -> Self {
        Self::new(|| stream::pending().boxed())
    }

    /// Open a new subscription.
    pub fn subscribe(&self) -> EventStream {
        (self.source)()
    }

    /// Keep only events matching `predicate`.
    pub fn filter(&self, predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Feed {
        let upstream = self.clone();
        let predicate = Arc::new(predicate);
        Feed::new(move || {
            let predicate = Arc::clone(&predicate);
            upstream
                .subscribe()
                .filter(move |event| future::ready(predicate(event)))
                .boxed()
        })
    }

    /// Transform every event.
    pub fn map(&self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Feed {
        let upstream = self.clone();
        let f = Arc::new(f);
        Feed::new(move || {
            let f = Arc::clone(&f);
            upstream.subscribe().map(move |event| f(event)).boxed()
        })
    }
}

impl fmt::Debug for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Feed(<source>)")
    }
}

// ---------------------------------------------------------------------------
// Combinators
// ---------------------------------------------------------------------------

/// Merge streams into one. Each source keeps its own order; events from
/// different sources interleave as they become ready. Ends when all sources end.
pub fn flatten(streams: impl IntoIterator<Item = EventStream>) -> EventStream {
    stream::select_all(streams).boxed()
}

/// Forward every event of `source` into `channel` on the current runtime.
pub fn pipe(source: EventStream, channel: Channel) -> Result<JoinHandle<()>> {
    let handle = error::runtime("pipe a stream into a channel")?;
    Ok(handle.spawn(async move {
        let mut source = source;
        let mut forwarded = 0_usize;
        while let Some(event) = source.next().await {
            channel.send(event);
            forwarded += 1;
        }
        debug!(forwarded, "pipe source ended");
    }))
}

// ===========================================================================
// Tests
// ===========================================================================
