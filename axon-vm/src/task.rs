//! Task records: one cooperative execution context each.

use crate::kont::{Frame, summarize};
use axon_core::{Env, FutureId, ParkReason, Prog, Store, TaskId, Value, VmError};
use std::fmt;

/// The focused control of a task.
#[derive(Clone)]
pub enum Focus {
    /// Evaluate a program node.
    Eval(Prog),
    /// Deliver a value to the top frame.
    Deliver(Value),
    /// Propagate an error up the kontinuation.
    Raise(VmError),
    /// Nothing to do until a wake sets a new focus.
    Suspended,
}

impl fmt::Debug for Focus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Focus::Eval(p) => write!(f, "Eval({})", p.tag()),
            Focus::Deliver(v) => write!(f, "Deliver({})", v.tag()),
            Focus::Raise(e) => write!(f, "Raise({e})"),
            Focus::Suspended => write!(f, "Suspended"),
        }
    }
}

/// Where a task is in its lifecycle.
#[derive(Debug, Clone)]
pub enum TaskStatus {
    /// Runnable: queued, or currently being stepped.
    Running,
    /// Suspended on a resource.
    Parked(ParkReason),
    /// Terminated with a value, published to the task's future.
    Completed,
    /// Terminated with an error, published to the task's future.
    Failed,
    /// Cancelled; the future delivers `Cancelled` to its waiters.
    Cancelled,
}

impl TaskStatus {
    /// True once the task can never step again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// One cooperatively scheduled execution context.
pub struct Task {
    /// This task's id.
    pub id: TaskId,
    /// Lifecycle state.
    pub status: TaskStatus,
    /// The focused control.
    pub focus: Focus,
    /// Reader bindings, restored by `Local`/`Safe` frames.
    pub env: Env,
    /// This task's view of the store.
    pub store: Store,
    /// The kontinuation; the top frame is last.
    pub kont: Vec<Frame>,
    /// The completion future this task publishes to.
    pub future: FutureId,
    /// Description of the most recently dispatched effect, for error
    /// snapshots.
    pub last_effect: Option<String>,
}

impl Task {
    /// A fresh runnable task focused on a program.
    pub fn new(id: TaskId, prog: Prog, env: Env, store: Store, future: FutureId) -> Self {
        Self {
            id,
            status: TaskStatus::Running,
            focus: Focus::Eval(prog),
            env,
            store,
            kont: Vec::new(),
            future,
            last_effect: None,
        }
    }

    /// The kontinuation rendered top-first.
    pub fn frame_summaries(&self) -> Vec<String> {
        summarize(&self.kont)
    }

    /// The kontinuation as one trace line.
    pub fn frame_summary(&self) -> String {
        let frames = self.frame_summaries();
        if frames.is_empty() {
            "<return>".to_string()
        } else {
            frames.join(" | ")
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("focus", &self.focus)
            .field("frames", &self.kont.len())
            .finish()
    }
}
