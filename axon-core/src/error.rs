//! The engine's error taxonomy.
//!
//! A single enum covers every failure kind the machine can raise.
//! Errors are `Clone` because a rejected future delivers the same error
//! to every waiter, and `Safe` frames reify them into ordinary values.

use thiserror::Error;

/// Errors raised inside the virtual machine.
///
/// These travel up a task's kontinuation: `Safe` frames catch them and
/// produce `Err` values, `Local` frames restore the environment and
/// re-raise, and the bottom of the stack rejects the task's future.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    /// The dispatch chain was exhausted without a handler taking the effect.
    #[error("unhandled effect: {effect}")]
    UnhandledEffect {
        /// Description of the effect nobody handled.
        effect: String,
    },

    /// A handler broke the dispatch protocol (e.g. delegated from the
    /// root chain's fallback position, or exceeded the dispatch-depth
    /// bound).
    #[error("handler protocol violation: {0}")]
    HandlerProtocol(String),

    /// A single-shot continuation was invoked a second time.
    #[error("continuation already resumed")]
    AlreadyResumed,

    /// Delivered to a cancelled task's wait point, and to anyone waiting
    /// on a cancelled task's future.
    #[error("task cancelled")]
    Cancelled,

    /// A resource was misused: more semaphore permits released than
    /// acquired, or the driver deadlocked with tasks still parked.
    #[error("resource error: {0}")]
    Resource(String),

    /// A reader key had no binding in the environment.
    #[error("missing reader binding: {0}")]
    MissingBinding(String),

    /// A state key was read before it was written.
    #[error("undefined state key: {0}")]
    MissingKey(String),

    /// An error propagated from user code: an IO thunk, a pure function
    /// embedded in the IR, or an explicit `ir::fail`.
    #[error("{0}")]
    User(String),
}

impl VmError {
    /// Shorthand for a user-raised error.
    pub fn user(message: impl Into<String>) -> Self {
        VmError::User(message.into())
    }
}
