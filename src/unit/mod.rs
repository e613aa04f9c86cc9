//! Keyed reactor composition.
//!
//! A [`Unit`] maps entity keys to child [`Reactor`]s. Given a feed of change
//! events shaped like the application state, it hands each child only the
//! slice under its key and re-tags whatever the child emits with that key, so
//! the merged output has the same shape as the changes it reads.
//!
//! The top-level unit closes the loop: [`Unit::mount`] creates the change
//! channel, wires the children to it, and pipes their merged inputs back into
//! it, so every input becomes a change visible to all entities.
//!
//! ```ignore
//! let app = unit([
//!     ("items", Reactors::from(items_reactor)),
//!     ("count", Reactors::from(count_reactor)),
//! ]);
//! let root = app.mount(&Value::Null)?;
//! root.push(json!({ "count": 0 }));
//! ```
//!
//! Keys are independent and their outputs are merged, so iteration order has
//! no effect on what is delivered. When several reactors share a key, their
//! outputs are merged fairly: each reactor's own order is kept, but events
//! ready at the same time may interleave in any order.

pub mod path;
pub mod stream;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::error::{self, Result};

pub use path::{association, field, has};
pub use stream::{flatten, pipe, Channel, EventStream, Feed};

/// Opaque configuration forwarded unchanged to every reactor.
pub type Options = Value;

// ---------------------------------------------------------------------------
// Reactor
// ---------------------------------------------------------------------------

/// Turns a feed of scoped state updates into a stream of inputs.
///
/// Reactors should subscribe to their feed while being called; a subscription
/// opened later only sees events sent after it.
#[derive(Clone)]
pub struct Reactor {
    react: Arc<dyn Fn(Feed, &Options) -> EventStream + Send + Sync>,
}

impl Reactor {
    /// Wrap a reactor function.
    pub fn new(react: impl Fn(Feed, &Options) -> EventStream + Send + Sync + 'static) -> Self {
        Self {
            react: Arc::new(react),
        }
    }

    /// Invoke the reactor.
    pub fn react(&self, updates: Feed, options: &Options) -> EventStream {
        (self.react)(updates, options)
    }
}

impl From<Unit> for Reactor {
    fn from(unit: Unit) -> Self {
        Reactor::new(move |source, options| unit.react(source, options))
    }
}

impl fmt::Debug for Reactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Reactor(<fn>)")
    }
}

/// One or more reactors registered under a single key.
#[derive(Clone, Debug, Default)]
pub struct Reactors(Vec<Reactor>);

impl Reactors {
    /// Number of reactors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no reactors.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Reactor> {
        self.0.iter()
    }
}

impl From<Reactor> for Reactors {
    fn from(reactor: Reactor) -> Self {
        Self(vec![reactor])
    }
}

impl From<Vec<Reactor>> for Reactors {
    fn from(reactors: Vec<Reactor>) -> Self {
        Self(reactors)
    }
}

impl From<Unit> for Reactors {
    fn from(unit: Unit) -> Self {
        Self(vec![Reactor::from(unit)])
    }
}

// ---------------------------------------------------------------------------
// Unit
// ---------------------------------------------------------------------------

/// A key-to-reactors table composed into a single reactor.
#[derive(Clone, Debug, Default)]
pub struct Unit {
    mapping: BTreeMap<String, Reactors>,
}

/// Build a unit from `(key, reactors)` pairs. Repeated keys accumulate.
pub fn unit<K, R>(mapping: impl IntoIterator<Item = (K, R)>) -> Unit
where
    K: Into<String>,
    R: Into<Reactors>,
{
    mapping
        .into_iter()
        .fold(Unit::new(), |unit, (id, reactors)| unit.entity(id, reactors))
}

impl Unit {
    /// An empty unit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register reactors under `id` (builder).
    pub fn entity(mut self, id: impl Into<String>, reactors: impl Into<Reactors>) -> Self {
        self.mapping
            .entry(id.into())
            .or_default()
            .0
            .extend(reactors.into().0);
        self
    }

    /// Registered keys, in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.mapping.keys().map(String::as_str)
    }

    /// Reactors registered under `id`.
    pub fn reactors(&self, id: &str) -> Option<&Reactors> {
        self.mapping.get(id)
    }

    /// Route `source` to the children and merge their re-tagged inputs.
    ///
    /// Only reads from `source`; the returned stream is the only output.
    pub fn react(&self, source: Feed, options: &Options) -> EventStream {
        let inputs = self.mapping.iter().map(|(id, reactors)| {
            trace!(entity = %id, reactors = reactors.len(), "wiring entity");
            let updates = source.filter(has(id.as_str())).map(field(id.as_str()));
            flatten(reactors.iter().map(|reactor| {
                reactor
                    .react(updates.clone(), options)
                    .map(association(id.as_str()))
                    .boxed()
            }))
        });
        flatten(inputs)
    }

    /// Mount as the application root: create the change channel and feed the
    /// merged inputs back into it.
    pub fn mount(&self, options: &Options) -> Result<Root> {
        let changes = self.channel()?;
        let pump = self.close_loop(&changes, options)?;
        Ok(Root { changes, pump })
    }

    /// Single entry point: with a source behave like [`react`](Self::react),
    /// without one mount as the root and return its change stream. The root's
    /// pump then runs for as long as the runtime does.
    pub fn call(&self, source: Option<Feed>, options: &Options) -> Result<EventStream> {
        match source {
            Some(source) => Ok(self.react(source, options)),
            None => {
                let changes = self.channel()?;
                let output = changes.subscribe();
                self.close_loop(&changes, options)?;
                Ok(output)
            }
        }
    }

    fn channel(&self) -> Result<Channel> {
        error::runtime("mount a root unit")?;
        Ok(Channel::new())
    }

    fn close_loop(&self, changes: &Channel, options: &Options) -> Result<JoinHandle<()>> {
        let inputs = self.react(changes.feed(), options);
        let pump = pipe(inputs, changes.clone())?;
        debug!(entities = self.mapping.len(), "root unit mounted");
        Ok(pump)
    }
}

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

/// A mounted top-level unit.
///
/// Dropping the root stops feeding inputs back into the change channel.
#[derive(Debug)]
pub struct Root {
    changes: Channel,
    pump: JoinHandle<()>,
}

impl Root {
    /// The application's change feed.
    pub fn changes(&self) -> Feed {
        self.changes.feed()
    }

    /// Subscribe to changes from now on.
    pub fn subscribe(&self) -> EventStream {
        self.changes.subscribe()
    }

    /// Inject a change, e.g. the initial state. Returns how many subscribers saw it.
    pub fn push(&self, change: Value) -> usize {
        self.changes.send(change)
    }

    /// Whether the children may still produce inputs.
    pub fn is_running(&self) -> bool {
        !self.pump.is_finished()
    }

    /// Stop the feedback loop.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for Root {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

// ===========================================================================
// Tests
// ===========================================================================
