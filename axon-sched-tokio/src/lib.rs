//! # axon-sched-tokio — wall-clock execution
//!
//! The realtime counterpart of `axon-sched-local`: the run clock is
//! elapsed wall time, `Delay` really sleeps, and external awaits run on
//! tokio's event loop, overlapping freely. Step order within the ready
//! queue is still submission-order and single-threaded — only the
//! clock and the outside world are real.

#![deny(missing_docs)]

mod driver;
mod scheduler;

pub use driver::drive;
pub use scheduler::TokioScheduler;
