//! The handler contract: how effects are fulfilled.

use crate::action::Action;
use crate::effect::Effect;
use crate::env::Env;
use crate::error::VmError;
use crate::id::TaskId;
use crate::ir::Prog;
use crate::store::Store;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Decides how one effect is fulfilled.
///
/// Handlers are consulted innermost-first: scope handlers installed by
/// `WithHandler` frames, then the root chain supplied at run start.
/// Returning [`Handled::Delegate`] is the only way to pass an effect to
/// the next handler out — this is the central extensibility mechanism.
///
/// A handler is a decision function, not an executor. It must not
/// mutate the environment or the store through side channels; mutation
/// happens through returned IR (`Put`, `Modify`, `Tell`) or, for the
/// built-in state handler that *implements* those effects, through the
/// store handle in the [`EffectCtx`]. Anything that touches the
/// scheduler travels as [`Action`]s.
pub trait Handler: Send + Sync {
    /// Decide how to fulfill `effect` for the performing task.
    fn handle(&self, effect: &Effect, ctx: &mut EffectCtx<'_>) -> Handled;

    /// A short name for traces and `Debug` output.
    fn name(&self) -> &'static str {
        "handler"
    }
}

/// A handler's decision.
#[non_exhaustive]
pub enum Handled {
    /// Resume the performer with a value.
    Resume(Value),
    /// Resume the performer by raising an error.
    Throw(VmError),
    /// Replace the perform with a program, evaluated in the performer's
    /// context (its env, frames, and handler scopes stay in force).
    Run(Prog),
    /// Not this handler's effect; try the next one out.
    Delegate,
    /// Ask the machine to execute external actions. Unless one of them
    /// wakes the performer's token, the performer stays suspended.
    Act(Vec<Action>),
}

impl fmt::Debug for Handled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handled::Resume(v) => f.debug_tuple("Resume").field(v).finish(),
            Handled::Throw(e) => f.debug_tuple("Throw").field(e).finish(),
            Handled::Run(_) => write!(f, "Run(..)"),
            Handled::Delegate => write!(f, "Delegate"),
            Handled::Act(actions) => f.debug_tuple("Act").field(actions).finish(),
        }
    }
}

/// What a handler can see while deciding.
pub struct EffectCtx<'a> {
    env: &'a Env,
    store: &'a Store,
    task: TaskId,
    token: ResumeToken,
}

impl<'a> EffectCtx<'a> {
    /// Build a dispatch context. The machine calls this once per
    /// dispatch with a fresh single-shot token for the performer.
    pub fn new(env: &'a Env, store: &'a Store, task: TaskId, token: ResumeToken) -> Self {
        Self {
            env,
            store,
            task,
            token,
        }
    }

    /// The performer's environment.
    pub fn env(&self) -> &Env {
        self.env
    }

    /// The performer's store handle.
    pub fn store(&self) -> &Store {
        self.store
    }

    /// The performing task.
    pub fn task(&self) -> TaskId {
        self.task
    }

    /// The performer's resume token. All clones share one single-shot
    /// flag: stash it in a waiter queue or an [`Action::Wake`], but it
    /// fires at most once.
    pub fn resume_token(&self) -> ResumeToken {
        self.token.clone()
    }
}

/// A single-shot continuation: "resume this task with a value or an
/// error".
///
/// Invoking a continuation twice is a protocol error; the machine
/// enforces it with one atomic flag shared by every clone of the token
/// ([`consume`](ResumeToken::consume) flips it exactly once).
#[derive(Clone)]
pub struct ResumeToken {
    task: TaskId,
    consumed: Arc<AtomicBool>,
}

impl PartialEq for ResumeToken {
    fn eq(&self, other: &Self) -> bool {
        self.task == other.task && Arc::ptr_eq(&self.consumed, &other.consumed)
    }
}

impl Eq for ResumeToken {}

impl ResumeToken {
    /// A fresh, unconsumed token for a task.
    pub fn new(task: TaskId) -> Self {
        Self {
            task,
            consumed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The task this token resumes.
    pub fn task(&self) -> TaskId {
        self.task
    }

    /// Mark the token used. The first call wins; every later call
    /// reports [`VmError::AlreadyResumed`].
    pub fn consume(&self) -> Result<(), VmError> {
        if self.consumed.swap(true, Ordering::SeqCst) {
            Err(VmError::AlreadyResumed)
        } else {
            Ok(())
        }
    }

    /// True once the token has fired.
    pub fn is_consumed(&self) -> bool {
        self.consumed.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for ResumeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResumeToken")
            .field("task", &self.task)
            .field("consumed", &self.is_consumed())
            .finish()
    }
}
