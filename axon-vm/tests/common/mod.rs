//! Shared harness: a machine over the simulation scheduler with the
//! default handler stack.

#![allow(dead_code)]

use axon_core::{Env, Handler, Prog, RunReport, Store};
use axon_sched_local::SimScheduler;
use axon_vm::{Machine, RunConfig};
use std::sync::Arc;

pub fn run(prog: Prog) -> RunReport {
    run_with(prog, vec![], Env::new(), Store::new(), RunConfig::default())
}

pub fn run_with(
    prog: Prog,
    handlers: Vec<Arc<dyn Handler>>,
    env: Env,
    store: Store,
    config: RunConfig,
) -> RunReport {
    let mut chain = axon_handlers::default_stack();
    chain.extend(handlers);
    let mut machine = Machine::new(
        env,
        store,
        chain,
        Box::new(SimScheduler::new()),
        config,
    );
    machine.start(prog);
    axon_sched_local::drive(&mut machine);
    machine.report()
}
