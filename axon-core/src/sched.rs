//! The scheduler protocol: who runs next, and when.

use crate::id::TaskId;
use crate::time::TimeMs;
use serde::{Deserialize, Serialize};

/// A submission hint. Schedulers that don't understand a hint treat it
/// as [`SubmitHint::Ready`].
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitHint {
    /// Runnable now, no preference.
    #[default]
    Ready,
    /// Runnable now with a priority; lower runs first, ties break by
    /// submission order.
    Priority(i64),
}

/// Owns the ready queue, the timed queue, and the run clock.
///
/// Implementations decide the ready order (FIFO, priority, simulation)
/// and what "the clock" means (virtual time that jumps, or elapsed wall
/// time). The machine is scheduler-agnostic: it submits, pops, and
/// parks through this trait only.
pub trait Scheduler: Send {
    /// The current reading of the run clock.
    fn now(&self) -> TimeMs;

    /// Enqueue a runnable task.
    fn submit(&mut self, task: TaskId, hint: SubmitHint);

    /// Pop the next runnable task, if any.
    fn next(&mut self) -> Option<TaskId>;

    /// Park a task until the clock reaches `wake_at`.
    fn schedule_at(&mut self, task: TaskId, wake_at: TimeMs);

    /// The earliest pending timed wake, if any.
    fn next_wake(&self) -> Option<TimeMs>;

    /// Advance to the next wake point and return the tasks that came
    /// due. A simulation clock jumps; a wall clock has moved on its
    /// own and this just harvests what is due.
    fn advance(&mut self) -> Vec<TaskId>;

    /// Forget a task entirely: drop it from the ready and timed queues.
    /// Used by cancellation.
    fn forget(&mut self, task: TaskId);

    /// Number of tasks ready to run, for traces.
    fn pending(&self) -> usize;
}
