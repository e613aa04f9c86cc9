//! Declarative effects returned from update functions.
//!
//! An [`Effect`] describes work for the runtime to do later: nothing, one
//! animation-frame tick, a non-failing [`Task`], or an ordered batch of other
//! effects. Effects are plain values. [`Effect::map`] rewrites the message
//! they will produce and [`Effect::send`] turns them into a [`Task`] that does
//! the work and delivers the result to an [`Address`].
//!
//! ```ignore
//! fn init(user: UserId) -> (Model, Effect<Action>) {
//!     (
//!         Model::loading(user),
//!         batch(vec![task(fetch_picture(user)), task(fetch_age(user))]),
//!     )
//! }
//! ```

pub mod address;
pub mod frame;
pub mod task;

use std::fmt;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::message::Message;

pub use address::Address;
pub use frame::{FrameScheduler, Frames, IntervalFrames, Time};
pub use task::{Deliver, Task};

type Tag<A> = Arc<dyn Fn(Time) -> A + Send + Sync>;

// ---------------------------------------------------------------------------
// Effect
// ---------------------------------------------------------------------------

/// A description of side effects producing messages of type `A`.
pub enum Effect<A> {
    /// Do nothing.
    None,
    /// Wait for the next animation frame and tag its timestamp.
    Tick(Tick<A>),
    /// Run a task that cannot fail and deliver its result.
    Task(Task<A>),
    /// Send each effect in order, each after the previous one completed.
    Batch(Vec<Effect<A>>),
}

impl<A> Clone for Effect<A> {
    fn clone(&self) -> Self {
        match self {
            Effect::None => Effect::None,
            Effect::Tick(tick) => Effect::Tick(tick.clone()),
            Effect::Task(task) => Effect::Task(task.clone()),
            Effect::Batch(effects) => Effect::Batch(effects.clone()),
        }
    }
}

impl<A> fmt::Debug for Effect<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::None => write!(f, "Effect::None"),
            Effect::Tick(_) => write!(f, "Effect::Tick(<tag>)"),
            Effect::Task(_) => write!(f, "Effect::Task(<future>)"),
            Effect::Batch(effects) => f.debug_tuple("Effect::Batch").field(effects).finish(),
        }
    }
}

impl<A> Default for Effect<A> {
    fn default() -> Self {
        Effect::None
    }
}

impl<A> From<Vec<Effect<A>>> for Effect<A> {
    fn from(effects: Vec<Effect<A>>) -> Self {
        Effect::Batch(effects)
    }
}

impl<A> From<Task<A>> for Effect<A> {
    fn from(task: Task<A>) -> Self {
        Effect::Task(task)
    }
}

impl<A> Effect<A> {
    /// Whether sending this effect can have no observable result.
    pub fn is_none(&self) -> bool {
        match self {
            Effect::None => true,
            Effect::Batch(effects) => effects.iter().all(Effect::is_none),
            Effect::Tick(_) | Effect::Task(_) => false,
        }
    }
}

impl<A: Message> Effect<A> {
    /// Rewrite the messages this effect produces.
    ///
    /// Pure: the receiver is untouched and nothing runs until the result is sent.
    pub fn map<B, F>(&self, f: F) -> Effect<B>
    where
        B: Message,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        self.map_shared(Arc::new(f))
    }

    fn map_shared<B: Message>(&self, f: Arc<dyn Fn(A) -> B + Send + Sync>) -> Effect<B> {
        match self {
            Effect::None => Effect::None,
            Effect::Tick(tick) => {
                let tag = Arc::clone(&tick.tag);
                Effect::Tick(Tick {
                    tag: Arc::new(move |time: Time| f(tag(time))),
                })
            }
            Effect::Task(task) => Effect::Task(task.map(move |value| f(value))),
            Effect::Batch(effects) => Effect::Batch(
                effects
                    .iter()
                    .map(|effect| effect.map_shared(Arc::clone(&f)))
                    .collect(),
            ),
        }
    }

    /// Describe the work of performing this effect and delivering its result
    /// to `address`, using the process-wide frame scheduler for ticks.
    pub fn send(&self, address: &Address<A>) -> Task<()> {
        self.send_with(address, &frame::scheduler())
    }

    /// Like [`send`](Self::send) with an explicit frame scheduler.
    pub fn send_with(&self, address: &Address<A>, frames: &Frames) -> Task<()> {
        match self {
            Effect::None => Task::succeed(()),
            Effect::Tick(tick) => {
                let frames = Arc::clone(frames);
                let tag = Arc::clone(&tick.tag);
                let address = address.clone();
                Task::io(move |deliver: Deliver<Time>| {
                    frames.request_frame(Box::new(move |time| deliver.resolve(time)));
                })
                .map(move |time| tag(time))
                .chain(move |message| address.send(message))
            }
            Effect::Task(task) => {
                let address = address.clone();
                task.chain(move |message| address.send(message))
            }
            Effect::Batch(effects) => {
                let steps: Arc<[Task<()>]> = effects
                    .iter()
                    .map(|effect| effect.send_with(address, frames))
                    .collect();
                Task::future(move || {
                    let steps = Arc::clone(&steps);
                    async move {
                        for step in steps.iter() {
                            step.run().await;
                        }
                    }
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tick
// ---------------------------------------------------------------------------

/// Payload of [`Effect::Tick`]: turns a frame timestamp into a message.
pub struct Tick<A> {
    tag: Tag<A>,
}

impl<A> Clone for Tick<A> {
    fn clone(&self) -> Self {
        Self {
            tag: Arc::clone(&self.tag),
        }
    }
}

impl<A> Tick<A> {
    /// Apply the tag to a timestamp.
    pub fn tag(&self, time: Time) -> A {
        (self.tag)(time)
    }
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

/// The effect that does nothing.
pub fn none<A>() -> Effect<A> {
    Effect::None
}

/// Request a clock tick for animations. `tag` turns the frame time into a message.
pub fn tick<A>(tag: impl Fn(Time) -> A + Send + Sync + 'static) -> Effect<A> {
    Effect::Tick(Tick { tag: Arc::new(tag) })
}

/// Wrap a task that cannot fail. Fallible work should resolve to a `Result`
/// or `Option` message instead.
pub fn task<A>(task: Task<A>) -> Effect<A> {
    Effect::Task(task)
}

/// Combine effects; they are sent strictly in order.
pub fn batch<A>(effects: Vec<Effect<A>>) -> Effect<A> {
    Effect::Batch(effects)
}

/// Adapt an update function that never requests effects.
pub fn nofx<M, A>(update: impl Fn(M, A) -> M) -> impl Fn(M, A) -> (M, Effect<A>) {
    move |model, action| (update(model, action), Effect::None)
}

/// A driver entry point: each call performs the effect against `address` on
/// the current tokio runtime.
///
/// Effects handed over outside a runtime are dropped with a warning.
pub fn service<A: Message>(address: Address<A>) -> impl Fn(Effect<A>) {
    move |fx| {
        if fx.is_none() {
            return;
        }
        trace!(effect = ?fx, "performing effect");
        if let Err(err) = fx.send(&address).perform() {
            warn!(%err, "effect dropped");
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
