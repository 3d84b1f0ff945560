//! The timed queue shared by the deterministic schedulers.

use axon_core::{TaskId, TimeMs};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// A priority queue of timed wakes, ordered by wake instant and stable
/// by insertion for equal instants.
#[derive(Default)]
pub(crate) struct TimedQueue {
    heap: BinaryHeap<Reverse<(TimeMs, u64, TaskId)>>,
    seq: u64,
}

impl TimedQueue {
    pub(crate) fn insert(&mut self, task: TaskId, wake_at: TimeMs) {
        self.heap.push(Reverse((wake_at, self.seq, task)));
        self.seq += 1;
    }

    pub(crate) fn earliest(&self) -> Option<TimeMs> {
        self.heap.peek().map(|Reverse((at, _, _))| *at)
    }

    /// Pop every task due at or before `now`, in wake order.
    pub(crate) fn pop_due(&mut self, now: TimeMs) -> Vec<TaskId> {
        let mut due = Vec::new();
        while let Some(Reverse((at, _, _))) = self.heap.peek() {
            if *at > now {
                break;
            }
            let Some(Reverse((_, _, task))) = self.heap.pop() else {
                break;
            };
            due.push(task);
        }
        due
    }

    /// Drop every entry for a task. O(n); cancellation is rare.
    pub(crate) fn forget(&mut self, task: TaskId) {
        self.heap = self
            .heap
            .drain()
            .filter(|Reverse((_, _, t))| *t != task)
            .collect();
    }
}
