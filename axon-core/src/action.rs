//! External actions: the typed protocol between handlers, the machine,
//! and its driver.
//!
//! A handler that needs anything beyond the performing task — a new
//! task, a park, a timed wake, another task resumed — declares it as an
//! [`Action`]. The machine executes every action itself except
//! [`Action::AwaitExternal`], which surfaces to the driver as work the
//! event loop must do.

use crate::effect::{Branch, ExternalFuture};
use crate::handler::ResumeToken;
use crate::id::TaskId;
use crate::ir::Prog;
use crate::sem::Semaphore;
use crate::store::StorePolicy;
use crate::time::{DurationMs, TimeMs};
use crate::value::Value;
use crate::error::VmError;
use std::fmt;

/// One external action requested by a handler.
#[non_exhaustive]
pub enum Action {
    /// Allocate a child task and submit it ready. The reply token
    /// resumes the performer with the child's handle.
    Spawn {
        /// The child's program.
        prog: Prog,
        /// Whether the child shares or snapshots the performer's store.
        store: StorePolicy,
        /// Resumed with `Value::Task(child)`.
        reply: ResumeToken,
    },
    /// Suspend the performer. Some token holder is responsible for
    /// waking it later.
    Park {
        /// Why the task is parked, for diagnostics and cancellation
        /// bookkeeping.
        reason: ParkReason,
    },
    /// Resume a parked task through its token. Covers both resolution
    /// (Ok) and rejection (Err).
    Wake {
        /// The stored continuation.
        token: ResumeToken,
        /// What the task resumes with.
        result: Result<Value, VmError>,
    },
    /// Park the performer until a task's future settles, then resume it
    /// with the task's outcome.
    WaitTask {
        /// The awaited task.
        task: TaskId,
    },
    /// Park the performer under a gather frame over these branches.
    Gather {
        /// The branches to join.
        branches: Vec<Branch>,
    },
    /// Park the performer under a race frame over these branches.
    Race {
        /// The competing branches.
        branches: Vec<Branch>,
    },
    /// Park the performer until the run clock reaches an instant.
    ScheduleAt {
        /// The wake instant.
        wake_at: TimeMs,
    },
    /// Park the performer for a duration from now. The machine resolves
    /// "now" — handlers never see the clock directly.
    ScheduleAfter {
        /// How long to sleep.
        delay: DurationMs,
    },
    /// Park the performer until the driver's event loop resolves the
    /// future.
    AwaitExternal {
        /// The external future.
        future: ExternalFuture,
    },
    /// Cancel a task, purging it from any waiter queue it occupies.
    CancelTask {
        /// The task to cancel.
        task: TaskId,
    },
    /// Allocate a semaphore; the reply token resumes the performer with
    /// its handle.
    CreateSemaphore {
        /// Initial permit count.
        permits: u32,
        /// Resumed with `Value::Sem(handle)`.
        reply: ResumeToken,
    },
    /// Read the run clock; the reply token resumes the performer with
    /// the time in milliseconds.
    GetTime {
        /// Resumed with `Value::Int(now_ms)`.
        reply: ResumeToken,
    },
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Spawn { store, .. } => write!(f, "Spawn({store:?})"),
            Action::Park { reason } => write!(f, "Park({reason:?})"),
            Action::Wake { token, result } => {
                write!(f, "Wake(task={}, ok={})", token.task(), result.is_ok())
            }
            Action::WaitTask { task } => write!(f, "WaitTask({task})"),
            Action::Gather { branches } => write!(f, "Gather(n={})", branches.len()),
            Action::Race { branches } => write!(f, "Race(n={})", branches.len()),
            Action::ScheduleAt { wake_at } => write!(f, "ScheduleAt({}ms)", wake_at.as_millis()),
            Action::ScheduleAfter { delay } => {
                write!(f, "ScheduleAfter({}ms)", delay.as_millis())
            }
            Action::AwaitExternal { .. } => write!(f, "AwaitExternal"),
            Action::CancelTask { task } => write!(f, "CancelTask({task})"),
            Action::CreateSemaphore { permits, .. } => write!(f, "CreateSemaphore({permits})"),
            Action::GetTime { .. } => write!(f, "GetTime"),
        }
    }
}

/// Why a task is suspended.
#[non_exhaustive]
#[derive(Clone)]
pub enum ParkReason {
    /// Waiting on another task's future.
    Task(TaskId),
    /// Queued on a semaphore.
    Semaphore(Semaphore),
    /// Waiting for the clock.
    Timer(TimeMs),
    /// Coordinating gather branches.
    Gather,
    /// Coordinating race branches.
    Race,
    /// Waiting on the driver's event loop.
    External,
}

impl fmt::Debug for ParkReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParkReason::Task(id) => write!(f, "task {id}"),
            ParkReason::Semaphore(sem) => write!(f, "semaphore {}", sem.id()),
            ParkReason::Timer(at) => write!(f, "timer {}ms", at.as_millis()),
            ParkReason::Gather => write!(f, "gather"),
            ParkReason::Race => write!(f, "race"),
            ParkReason::External => write!(f, "external"),
        }
    }
}
