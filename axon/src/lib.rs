//! # axon — umbrella crate
//!
//! A single import surface for the axon effects engine: the control IR
//! and protocols (`axon-core`), the step engine (`axon-vm`), the
//! default handler stack (`axon-handlers`), and the two reference
//! drivers (`axon-sched-local`, `axon-sched-tokio`), plus the [`run`] /
//! [`run_async`] entry points and a [`prelude`] for the happy path.
//!
//! ```
//! use axon::prelude::*;
//!
//! let program = ir::bind(fx::put("n", 1), |_| fx::get("n"));
//! let report = axon::run(program, vec![]);
//! assert_eq!(report.result, Ok(Value::Int(1)));
//! ```

#![deny(missing_docs)]

pub use axon_core;
pub use axon_handlers;
pub use axon_sched_local;
pub use axon_sched_tokio;
pub use axon_vm;

use axon_core::{Env, Handler, Prog, RunReport, Store, Value};
use axon_sched_local::SimScheduler;
use axon_sched_tokio::TokioScheduler;
use axon_vm::{Machine, RunConfig};
use std::sync::Arc;

/// Options for a run: initial environment and store, tracing, safety
/// bounds.
///
/// ```
/// use axon::{RunOptions, prelude::*};
///
/// let report = axon::run_with(
///     fx::ask("who"),
///     vec![],
///     RunOptions::new().env([("who", "world")]).traced(),
/// );
/// assert_eq!(report.result, Ok(Value::from("world")));
/// assert!(report.trace.is_some());
/// ```
#[derive(Default)]
pub struct RunOptions {
    env: Env,
    store: Store,
    config: RunConfig,
}

impl RunOptions {
    /// Defaults: empty environment, empty store, no tracing, no step
    /// bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial reader bindings.
    pub fn env<K: Into<String>, V: Into<Value>>(
        mut self,
        bindings: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.env = Env::new().with(bindings);
        self
    }

    /// Initial store cells.
    pub fn store<K: Into<String>, V: Into<Value>>(
        mut self,
        cells: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.store = cells.into_iter().collect();
        self
    }

    /// Record a step event per reduction.
    pub fn traced(mut self) -> Self {
        self.config.trace = true;
        self
    }

    /// Full engine configuration.
    pub fn config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }
}

/// The root handler chain: the default stack outermost, then the
/// user's handlers (element 0 outermost, last innermost). Dispatch
/// walks innermost-first, so user handlers are always consulted before
/// the defaults they shadow.
fn root_chain(handlers: Vec<Arc<dyn Handler>>) -> Vec<Arc<dyn Handler>> {
    let mut chain = axon_handlers::default_stack();
    chain.extend(handlers);
    chain
}

/// Run a program to completion under the deterministic simulation
/// driver: virtual time starting at zero, submission-order scheduling,
/// reproducible interleavings.
pub fn run(prog: Prog, handlers: Vec<Arc<dyn Handler>>) -> RunReport {
    run_with(prog, handlers, RunOptions::new())
}

/// [`run`] with explicit options.
pub fn run_with(prog: Prog, handlers: Vec<Arc<dyn Handler>>, options: RunOptions) -> RunReport {
    let mut machine = Machine::new(
        options.env,
        options.store,
        root_chain(handlers),
        Box::new(SimScheduler::new()),
        options.config,
    );
    machine.start(prog);
    axon_sched_local::drive(&mut machine);
    machine.report()
}

/// Run a program to completion under the wall-clock driver on the
/// caller's tokio runtime: `Delay` really sleeps and `Await` runs on
/// the event loop. Everything else behaves exactly as under [`run`].
pub async fn run_async(prog: Prog, handlers: Vec<Arc<dyn Handler>>) -> RunReport {
    run_async_with(prog, handlers, RunOptions::new()).await
}

/// [`run_async`] with explicit options.
pub async fn run_async_with(
    prog: Prog,
    handlers: Vec<Arc<dyn Handler>>,
    options: RunOptions,
) -> RunReport {
    let mut machine = Machine::new(
        options.env,
        options.store,
        root_chain(handlers),
        Box::new(TokioScheduler::new()),
        options.config,
    );
    machine.start(prog);
    axon_sched_tokio::drive(&mut machine).await;
    machine.report()
}

/// Happy-path imports for writing and running programs.
pub mod prelude {
    pub use crate::{RunOptions, run, run_async, run_async_with, run_with};
    pub use axon_core::{
        Branch, Ctrl, Effect, EffectCtx, EffectKind, Env, Handled, Handler, ListenResult, Prog,
        RunReport, Store, TaskId, Value, VmError, fx, ir,
    };
    pub use axon_handlers::default_stack;
    pub use axon_sched_local::{FifoScheduler, PriorityScheduler, ReadyOrder, SimScheduler};
    pub use axon_sched_tokio::TokioScheduler;
    pub use axon_vm::{Machine, RunConfig};
}
