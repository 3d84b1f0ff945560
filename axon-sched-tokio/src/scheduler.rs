//! The wall-clock scheduler.

use axon_core::{Scheduler, SubmitHint, TaskId, TimeMs};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::time::Instant;

/// Submission-order scheduling over elapsed wall time.
///
/// `now` is the time since the scheduler was built. [`advance`] only
/// harvests wakes that are already due — the clock moves by itself, so
/// the driver sleeps until [`next_wake`] instead of jumping.
///
/// [`advance`]: Scheduler::advance
/// [`next_wake`]: Scheduler::next_wake
pub struct TokioScheduler {
    start: Instant,
    ready: VecDeque<TaskId>,
    timed: BinaryHeap<Reverse<(TimeMs, u64, TaskId)>>,
    seq: u64,
}

impl TokioScheduler {
    /// A wall-clock scheduler starting its clock now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            ready: VecDeque::new(),
            timed: BinaryHeap::new(),
            seq: 0,
        }
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> TimeMs {
        TimeMs::from_millis(self.start.elapsed().as_millis() as u64)
    }

    fn submit(&mut self, task: TaskId, _hint: SubmitHint) {
        self.ready.push_back(task);
    }

    fn next(&mut self) -> Option<TaskId> {
        self.ready.pop_front()
    }

    fn schedule_at(&mut self, task: TaskId, wake_at: TimeMs) {
        self.timed.push(Reverse((wake_at, self.seq, task)));
        self.seq += 1;
    }

    fn next_wake(&self) -> Option<TimeMs> {
        self.timed.peek().map(|Reverse((at, _, _))| *at)
    }

    fn advance(&mut self) -> Vec<TaskId> {
        let now = self.now();
        let mut due = Vec::new();
        while let Some(Reverse((at, _, _))) = self.timed.peek() {
            if *at > now {
                break;
            }
            if let Some(Reverse((_, _, task))) = self.timed.pop() {
                due.push(task);
            }
        }
        due
    }

    fn forget(&mut self, task: TaskId) {
        self.ready.retain(|t| *t != task);
        self.timed = self
            .timed
            .drain()
            .filter(|Reverse((_, _, t))| *t != task)
            .collect();
    }

    fn pending(&self) -> usize {
        self.ready.len()
    }
}
