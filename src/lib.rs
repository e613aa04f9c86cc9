//! # reactor-fx
//!
//! Declarative effects and keyed reactor composition for UI architectures.
//!
//! An application's update function returns its next model together with an
//! [`Effect`](effects::Effect) describing the work it wants done. The runtime
//! later sends that effect to an [`Address`](effects::Address). Components are
//! wired together with [`unit`](unit::unit), which routes slices of a shared
//! change stream to child reactors and merges their inputs back.
//!
//! ## Core Systems
//!
//! - **[`effects`]** — `none`, `tick`, `task`, `batch`; `map` / `send`; `nofx`, `service`
//! - **[`unit`]** — keyed reactor composition, root feedback loop, streams and feeds
//! - **[`message`]** — the bound shared by every effect payload
//! - **[`config`]** — frame rate
//! - **[`error`]** — errors at the runtime boundary
//! - **[`testing`]** — manual frames and stream recording for headless tests

// Foundation
pub mod config;
pub mod error;
pub mod message;

// Effects and composition
pub mod effects;
pub mod unit;

// Test support
pub mod testing;

pub use config::FxConfig;
pub use effects::{batch, nofx, none, service, task, tick, Address, Effect, Task};
pub use error::{Error, Result};
pub use message::Message;
pub use unit::{unit, Feed, Reactor, Reactors, Root, Unit};
