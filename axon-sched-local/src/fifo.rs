//! The plain FIFO scheduler.

use crate::timed::TimedQueue;
use axon_core::{Scheduler, SubmitHint, TaskId, TimeMs};
use std::collections::VecDeque;

/// Submission-order scheduling over a virtual clock.
///
/// The minimal discipline: tasks run in the order they were submitted,
/// hints are ignored. Timed wakes jump the virtual clock exactly like
/// [`crate::SimScheduler`].
pub struct FifoScheduler {
    ready: VecDeque<TaskId>,
    timed: TimedQueue,
    now: TimeMs,
}

impl FifoScheduler {
    /// An empty FIFO scheduler.
    pub fn new() -> Self {
        Self {
            ready: VecDeque::new(),
            timed: TimedQueue::default(),
            now: TimeMs::ZERO,
        }
    }
}

impl Default for FifoScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for FifoScheduler {
    fn now(&self) -> TimeMs {
        self.now
    }

    fn submit(&mut self, task: TaskId, _hint: SubmitHint) {
        self.ready.push_back(task);
    }

    fn next(&mut self) -> Option<TaskId> {
        self.ready.pop_front()
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
        self.ready.retain(|t| *t != task);
        self.timed.forget(task);
    }

    fn pending(&self) -> usize {
        self.ready.len()
    }
}
