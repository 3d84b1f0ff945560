//! # axon-core — IR, values, and protocol traits for the axon effects engine
//!
//! This crate defines the data model and the protocol boundaries that
//! compose into the axon virtual machine.
//!
//! ## The Data Model
//!
//! | Module | Types | What it holds |
//! |--------|-------|---------------|
//! | [`ir`] | [`Ctrl`], [`Prog`] | The control IR the machine evaluates |
//! | [`effect`] | [`Effect`], [`EffectKind`] | Effect payloads dispatched to handlers |
//! | [`value`] | [`Value`], [`ListenResult`] | Runtime values |
//! | [`env`] | [`Env`] | Shared-immutable reader bindings |
//! | [`store`] | [`Store`] | Task-visible mutable state |
//!
//! ## The Protocols
//!
//! | Protocol | Trait | What it does |
//! |----------|-------|-------------|
//! | Handler | [`Handler`] | How one effect is fulfilled |
//! | Scheduler | [`Scheduler`] | Who runs next, and when |
//!
//! ## Design Principle
//!
//! Effects are data, not calls. A program never executes a side effect;
//! it *performs* an effect value and a handler decides what that means.
//! The handler itself never executes external work either — it returns a
//! decision ([`Handled`]), and anything that touches the world outside
//! the performing task travels as an [`Action`] for the machine and its
//! driver to execute. This is the key composability mechanism: the same
//! program runs under a deterministic simulation clock, a wall-clock
//! driver, or a test harness that captures effects for assertions.
//!
//! ## Dependency Notes
//!
//! This crate depends on `serde_json::Value` as a first-class payload
//! variant of [`Value`]. JSON is the universal interchange format for
//! the systems this engine embeds into, and `serde_json::Value` is the
//! de facto standard in the Rust ecosystem. IR nodes and effect payloads
//! embed closures and are deliberately not serializable.

#![deny(missing_docs)]

pub mod action;
pub mod effect;
pub mod env;
pub mod error;
pub mod handler;
pub mod id;
pub mod ir;
pub mod report;
pub mod sched;
pub mod sem;
pub mod store;
pub mod time;
pub mod value;

#[cfg(feature = "test-utils")]
pub mod test_utils;

// Re-exports for convenience
pub use action::{Action, ParkReason};
pub use effect::{Branch, Effect, EffectKind, ExternalFuture, IoThunk, ModifyFn, Site, fx};
pub use env::Env;
pub use error::VmError;
pub use handler::{EffectCtx, Handled, Handler, ResumeToken};
pub use id::{FutureId, SemaphoreId, TaskId};
pub use ir::{BindFn, CallArgs, CallMeta, Ctrl, Kernel, MapFn, Prog, Rewrite, Transform};
pub use report::{RunReport, StepEvent};
pub use sched::{Scheduler, SubmitHint};
pub use sem::Semaphore;
pub use store::{CLOCK_KEY, GRAPH_KEY, LOG_KEY, MEMO_PREFIX, Store, StorePolicy};
pub use time::{DurationMs, TimeMs};
pub use value::{ListenResult, Value};
