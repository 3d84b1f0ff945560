//! The discrete-event simulation scheduler.

use crate::timed::TimedQueue;
use axon_core::{Scheduler, SubmitHint, TaskId, TimeMs};
use std::collections::VecDeque;
use tracing::trace;

/// Ready-queue discipline for [`SimScheduler`].
///
/// `Fifo` runs sibling tasks in submission order, which is what the
/// engine's fairness guarantees are stated against (semaphore FIFO
/// across spawn order, gather branches stepping in input order).
/// `Lifo` is a depth-first stack: the most recently spawned task runs
/// first. It is offered for experiments; the fairness guarantees still
/// hold *among blocked waiters*, but sibling start order inverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadyOrder {
    /// Submission order (the reference discipline).
    #[default]
    Fifo,
    /// Depth-first stack order.
    Lifo,
}

/// A discrete-event scheduler: a ready queue plus a timed queue over a
/// virtual clock that starts at zero and jumps to the next wake instant
/// whenever the ready queue drains.
pub struct SimScheduler {
    ready: VecDeque<TaskId>,
    order: ReadyOrder,
    timed: TimedQueue,
    now: TimeMs,
}

impl SimScheduler {
    /// A simulation scheduler with the reference (FIFO) ready order.
    pub fn new() -> Self {
        Self::with_order(ReadyOrder::Fifo)
    }

    /// A simulation scheduler with an explicit ready order.
    pub fn with_order(order: ReadyOrder) -> Self {
        Self {
            ready: VecDeque::new(),
            order,
            timed: TimedQueue::default(),
            now: TimeMs::ZERO,
        }
    }
}

impl Default for SimScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for SimScheduler {
    fn now(&self) -> TimeMs {
        self.now
    }

    fn submit(&mut self, task: TaskId, _hint: SubmitHint) {
        self.ready.push_back(task);
    }

    fn next(&mut self) -> Option<TaskId> {
        match self.order {
            ReadyOrder::Fifo => self.ready.pop_front(),
            ReadyOrder::Lifo => self.ready.pop_back(),
        }
    }

    fn schedule_at(&mut self, task: TaskId, wake_at: TimeMs) {
        self.timed.insert(task, wake_at);
    }

    fn next_wake(&self) -> Option<TimeMs> {
        self.timed.earliest()
    }

    fn advance(&mut self) -> Vec<TaskId> {
        let Some(earliest) = self.timed.earliest() else {
            return Vec::new();
        };
        if earliest > self.now {
            trace!(from = self.now.as_millis(), to = earliest.as_millis(), "clock jump");
            self.now = earliest;
        }
        self.timed.pop_due(self.now)
    }

    fn forget(&mut self, task: TaskId) {
        self.ready.retain(|t| *t != task);
        self.timed.forget(task);
    }

    fn pending(&self) -> usize {
        self.ready.len()
    }
}
