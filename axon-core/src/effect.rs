//! Effect payloads — operations declared by programs for handlers to
//! fulfill.
//!
//! An effect is data. Performing one never executes anything by itself;
//! the handler stack decides what it means, and anything that touches
//! the scheduler travels onward as an [`crate::Action`]. The built-in
//! families cover reader, state, writer, io, time, concurrency, and
//! semaphore operations; foreign effect vocabularies are layered on by
//! scoped handlers rewriting or delegating these.

use crate::error::VmError;
use crate::id::TaskId;
use crate::ir::Prog;
use crate::sem::Semaphore;
use crate::store::StorePolicy;
use crate::time::{DurationMs, TimeMs};
use crate::value::Value;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// A synchronous external side effect, invoked by the io handler.
pub type IoThunk = Arc<dyn Fn() -> Result<Value, VmError> + Send + Sync>;

/// A pure state update applied by `Modify` as one logical transition.
pub type ModifyFn = Arc<dyn Fn(Value) -> Result<Value, VmError> + Send + Sync>;

/// The source location an effect was created at. Diagnostic only, never
/// semantic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Site {
    /// Source file.
    pub file: &'static str,
    /// Source line.
    pub line: u32,
}

/// An effect payload plus its optional creation site.
#[derive(Clone)]
pub struct Effect {
    /// The operation requested.
    pub kind: EffectKind,
    /// Where the effect was created, if recorded.
    pub site: Option<Site>,
}

impl Effect {
    /// Wrap an operation with no recorded site.
    pub fn new(kind: EffectKind) -> Self {
        Self { kind, site: None }
    }

    /// Attach a creation site.
    pub fn at(mut self, site: Site) -> Self {
        self.site = Some(site);
        self
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.site {
            Some(site) => write!(f, "{:?} @ {}:{}", self.kind, site.file, site.line),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

impl From<EffectKind> for Effect {
    fn from(kind: EffectKind) -> Self {
        Effect::new(kind)
    }
}

/// One branch of a `Gather` or `Race`: either a program to spawn into a
/// child task, or an already-running task to join.
#[derive(Clone)]
pub enum Branch {
    /// Spawn this program as a child sharing the performer's store.
    Prog(Prog),
    /// Join an already-spawned task.
    Task(TaskId),
}

impl fmt::Debug for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Branch::Prog(_) => write!(f, "Prog(..)"),
            Branch::Task(id) => write!(f, "Task({id})"),
        }
    }
}

/// The built-in effect vocabulary.
#[non_exhaustive]
#[derive(Clone)]
pub enum EffectKind {
    /// Read a reader binding.
    Ask {
        /// The binding key.
        key: String,
    },
    /// Read a state key.
    Get {
        /// The state key.
        key: String,
    },
    /// Write a state key.
    Put {
        /// The state key.
        key: String,
        /// The value to store.
        value: Value,
    },
    /// Update a state key with a pure function, as one transition.
    Modify {
        /// The state key.
        key: String,
        /// The update function.
        f: ModifyFn,
    },
    /// Append an entry to the writer log.
    Tell {
        /// The entry to append.
        entry: Value,
    },
    /// Perform an external synchronous side effect.
    Io {
        /// The side effect.
        thunk: IoThunk,
    },
    /// Read the current clock.
    GetTime,
    /// Park until a duration has elapsed.
    Delay {
        /// How long to sleep.
        duration: DurationMs,
    },
    /// Park until an absolute deadline.
    WaitUntil {
        /// The wake instant.
        deadline: TimeMs,
    },
    /// Start a child task; resumes immediately with its handle.
    Spawn {
        /// The child's program.
        prog: Prog,
        /// Whether the child shares or snapshots the store.
        store: StorePolicy,
    },
    /// Park until a task completes; resumes with its value.
    Wait {
        /// The awaited task.
        task: TaskId,
    },
    /// Run branches to completion; resumes with their values in input
    /// order.
    Gather {
        /// The branches to join.
        branches: Vec<Branch>,
    },
    /// Resume with the first branch to complete; losers are cancelled.
    Race {
        /// The competing branches.
        branches: Vec<Branch>,
    },
    /// Cancel a task.
    Cancel {
        /// The task to cancel.
        task: TaskId,
    },
    /// Create a semaphore; resumes with its handle.
    SemCreate {
        /// Initial permit count.
        permits: u32,
    },
    /// Acquire a permit, parking FIFO when none is available.
    SemAcquire {
        /// The semaphore handle.
        sem: Semaphore,
    },
    /// Release a permit, waking the longest-parked waiter.
    SemRelease {
        /// The semaphore handle.
        sem: Semaphore,
    },
    /// Await an external future. Only meaningful under a driver that can
    /// reach an event loop.
    Await {
        /// The external future.
        future: ExternalFuture,
    },
    /// A domain-specific effect. Named string + arbitrary payload; no
    /// built-in handler takes these, so an unhandled `Custom` fails the
    /// task with `UnhandledEffect`. When a custom operation stabilizes
    /// across several handler stacks it graduates to a named variant.
    Custom {
        /// The operation name handlers match on.
        name: String,
        /// The operation payload.
        payload: Value,
    },
}

impl fmt::Debug for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectKind::Ask { key } => write!(f, "Ask({key})"),
            EffectKind::Get { key } => write!(f, "Get({key})"),
            EffectKind::Put { key, value } => write!(f, "Put({key}, {value:?})"),
            EffectKind::Modify { key, .. } => write!(f, "Modify({key})"),
            EffectKind::Tell { entry } => write!(f, "Tell({entry:?})"),
            EffectKind::Io { .. } => write!(f, "Io"),
            EffectKind::GetTime => write!(f, "GetTime"),
            EffectKind::Delay { duration } => write!(f, "Delay({}ms)", duration.as_millis()),
            EffectKind::WaitUntil { deadline } => {
                write!(f, "WaitUntil({}ms)", deadline.as_millis())
            }
            EffectKind::Spawn { store, .. } => write!(f, "Spawn({store:?})"),
            EffectKind::Wait { task } => write!(f, "Wait({task})"),
            EffectKind::Gather { branches } => write!(f, "Gather(n={})", branches.len()),
            EffectKind::Race { branches } => write!(f, "Race(n={})", branches.len()),
            EffectKind::Cancel { task } => write!(f, "Cancel({task})"),
            EffectKind::SemCreate { permits } => write!(f, "SemCreate({permits})"),
            EffectKind::SemAcquire { sem } => write!(f, "SemAcquire({})", sem.id()),
            EffectKind::SemRelease { sem } => write!(f, "SemRelease({})", sem.id()),
            EffectKind::Await { .. } => write!(f, "Await"),
            EffectKind::Custom { name, .. } => write!(f, "Custom({name})"),
        }
    }
}

/// A cloneable wrapper around a single-consumption external future.
///
/// Effect payloads must be `Clone` so intercept transforms can rewrite
/// them, but a future is consumed exactly once. The wrapper shares the
/// future behind a lock; [`take`](ExternalFuture::take) hands it to
/// whichever driver awaits it first.
#[derive(Clone)]
pub struct ExternalFuture {
    inner: Arc<Mutex<Option<BoxFuture<'static, Result<Value, VmError>>>>>,
}

impl ExternalFuture {
    /// Wrap a future for performing via `Await`.
    pub fn new(
        fut: impl std::future::Future<Output = Result<Value, VmError>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(Box::pin(fut)))),
        }
    }

    /// Take the future out. Returns `None` if it was already consumed.
    pub fn take(&self) -> Option<BoxFuture<'static, Result<Value, VmError>>> {
        self.inner.lock().take()
    }
}

impl fmt::Debug for ExternalFuture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExternalFuture")
    }
}

/// Effect constructors, each returning a ready-to-run program.
pub mod fx {
    use super::*;
    use crate::ir::perform;

    fn fx(kind: EffectKind) -> Prog {
        perform(Effect::new(kind))
    }

    /// Read a reader binding.
    pub fn ask(key: impl Into<String>) -> Prog {
        fx(EffectKind::Ask { key: key.into() })
    }

    /// Read a state key.
    pub fn get(key: impl Into<String>) -> Prog {
        fx(EffectKind::Get { key: key.into() })
    }

    /// Write a state key.
    pub fn put(key: impl Into<String>, value: impl Into<Value>) -> Prog {
        fx(EffectKind::Put {
            key: key.into(),
            value: value.into(),
        })
    }

    /// Update a state key with a pure function.
    pub fn modify(
        key: impl Into<String>,
        f: impl Fn(Value) -> Result<Value, VmError> + Send + Sync + 'static,
    ) -> Prog {
        fx(EffectKind::Modify {
            key: key.into(),
            f: Arc::new(f),
        })
    }

    /// Append an entry to the writer log.
    pub fn tell(entry: impl Into<Value>) -> Prog {
        fx(EffectKind::Tell {
            entry: entry.into(),
        })
    }

    /// Perform an external synchronous side effect.
    pub fn io(thunk: impl Fn() -> Result<Value, VmError> + Send + Sync + 'static) -> Prog {
        fx(EffectKind::Io {
            thunk: Arc::new(thunk),
        })
    }

    /// Read the current clock, in milliseconds since the run started.
    pub fn get_time() -> Prog {
        fx(EffectKind::GetTime)
    }

    /// Park for a duration given in fractional seconds.
    pub fn delay_secs(secs: f64) -> Prog {
        delay(DurationMs::from_secs_f64(secs))
    }

    /// Park for a duration.
    pub fn delay(duration: DurationMs) -> Prog {
        fx(EffectKind::Delay { duration })
    }

    /// Park until an absolute deadline on the run's clock.
    pub fn wait_until(deadline: TimeMs) -> Prog {
        fx(EffectKind::WaitUntil { deadline })
    }

    /// Spawn a child task sharing the performer's store.
    pub fn spawn(prog: Prog) -> Prog {
        fx(EffectKind::Spawn {
            prog,
            store: StorePolicy::Shared,
        })
    }

    /// Spawn a child task over a snapshot of the performer's store.
    pub fn spawn_isolated(prog: Prog) -> Prog {
        fx(EffectKind::Spawn {
            prog,
            store: StorePolicy::Snapshot,
        })
    }

    /// Park until a task completes.
    pub fn wait(task: TaskId) -> Prog {
        fx(EffectKind::Wait { task })
    }

    /// Run child programs to completion; resume with their values in
    /// input order.
    pub fn gather(progs: Vec<Prog>) -> Prog {
        gather_branches(progs.into_iter().map(Branch::Prog).collect())
    }

    /// Gather over explicit branches (programs or running tasks).
    pub fn gather_branches(branches: Vec<Branch>) -> Prog {
        fx(EffectKind::Gather { branches })
    }

    /// Resume with the first child to complete; cancel the rest.
    pub fn race(progs: Vec<Prog>) -> Prog {
        race_branches(progs.into_iter().map(Branch::Prog).collect())
    }

    /// Race over explicit branches (programs or running tasks).
    pub fn race_branches(branches: Vec<Branch>) -> Prog {
        fx(EffectKind::Race { branches })
    }

    /// Cancel a task.
    pub fn cancel(task: TaskId) -> Prog {
        fx(EffectKind::Cancel { task })
    }

    /// Create a semaphore with an initial permit count.
    pub fn sem_create(permits: u32) -> Prog {
        fx(EffectKind::SemCreate { permits })
    }

    /// Acquire a permit, parking FIFO when none is available.
    pub fn sem_acquire(sem: Semaphore) -> Prog {
        fx(EffectKind::SemAcquire { sem })
    }

    /// Release a permit.
    pub fn sem_release(sem: Semaphore) -> Prog {
        fx(EffectKind::SemRelease { sem })
    }

    /// Await an external future.
    pub fn await_external(
        fut: impl std::future::Future<Output = Result<Value, VmError>> + Send + 'static,
    ) -> Prog {
        fx(EffectKind::Await {
            future: ExternalFuture::new(fut),
        })
    }

    /// Perform a domain-specific effect. Some handler in the stack must
    /// take it, or the task fails with `UnhandledEffect`.
    pub fn custom(name: impl Into<String>, payload: impl Into<Value>) -> Prog {
        fx(EffectKind::Custom {
            name: name.into(),
            payload: payload.into(),
        })
    }
}
