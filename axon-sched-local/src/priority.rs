//! The priority scheduler.

use crate::timed::TimedQueue;
use axon_core::{Scheduler, SubmitHint, TaskId, TimeMs};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Priority scheduling over a virtual clock.
///
/// Lower numeric hints run first; equal hints run in submission order.
/// A plain [`SubmitHint::Ready`] counts as priority zero.
pub struct PriorityScheduler {
    ready: BinaryHeap<Reverse<(i64, u64, TaskId)>>,
    seq: u64,
    timed: TimedQueue,
    now: TimeMs,
}

impl PriorityScheduler {
    /// An empty priority scheduler.
    pub fn new() -> Self {
        Self {
            ready: BinaryHeap::new(),
            seq: 0,
            timed: TimedQueue::default(),
            now: TimeMs::ZERO,
        }
    }
}

impl Default for PriorityScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for PriorityScheduler {
    fn now(&self) -> TimeMs {
        self.now
    }

    fn submit(&mut self, task: TaskId, hint: SubmitHint) {
        let priority = match hint {
            SubmitHint::Priority(p) => p,
            _ => 0,
        };
        self.ready.push(Reverse((priority, self.seq, task)));
        self.seq += 1;
    }

    fn next(&mut self) -> Option<TaskId> {
        self.ready.pop().map(|Reverse((_, _, task))| task)
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
            self.now = earliest;
        }
        self.timed.pop_due(self.now)
    }

    fn forget(&mut self, task: TaskId) {
        self.ready = self
            .ready
            .drain()
            .filter(|Reverse((_, _, t))| *t != task)
            .collect();
        self.timed.forget(task);
    }

    fn pending(&self) -> usize {
        self.ready.len()
    }
}
