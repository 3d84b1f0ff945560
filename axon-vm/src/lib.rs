//! # axon-vm — the step engine
//!
//! A CESK-shaped machine over the `axon-core` IR: each task carries a
//! focused **C**ontrol, an **E**nvironment, a **S**tore view, and a
//! **K**ontinuation (a stack of frames), and the step function advances
//! one task by exactly one reduction. The [`Machine`] owns the task table, the
//! per-task completion futures, and the scheduler, and executes every
//! external action a handler requests except awaiting the outside world
//! — those surface as [`ExternalWork`] for a driver to resolve.
//!
//! Drivers live elsewhere (`axon-sched-local`, `axon-sched-tokio`);
//! this crate never sleeps, never blocks, and never touches a wall
//! clock.

#![deny(missing_docs)]

mod dispatch;
mod kont;
mod machine;
mod step;
mod task;

pub mod config;

pub use config::RunConfig;
pub use kont::Frame;
pub use machine::{ExternalWork, Machine};
pub use task::{Focus, Task, TaskStatus};
