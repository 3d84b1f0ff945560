//! Kontinuation frames: what to do with the next value or error.

use axon_core::{
    BindFn, CallMeta, Env, Handler, Kernel, MapFn, Prog, TaskId, Transform, Value,
};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// One entry of a task's kontinuation. The top frame (end of the
/// vector) receives the next delivered value or raised error.
#[non_exhaustive]
pub enum Frame {
    /// Feed the value to a continuation builder (`FlatMap`).
    Bind(BindFn),
    /// Apply a pure function to the value (`Map`).
    Map(MapFn),
    /// Scope marker: this handler is innermost for everything above.
    Handler(Arc<dyn Handler>),
    /// Restore the saved environment on value or error (`Local`).
    Local {
        /// The environment outside the scope.
        saved: Env,
    },
    /// On a value, wrap it with the writer entries appended since
    /// `mark`; on an error, discard the captures and re-raise.
    Listen {
        /// Log length when the frame was pushed.
        mark: usize,
    },
    /// On a value produce `Ok`, on an error restore the environment and
    /// produce `Err`.
    Safe {
        /// The environment outside the scope.
        saved: Env,
    },
    /// Rewrite effects dispatched above this frame.
    Intercept(Transform),
    /// Accumulate call arguments left-to-right, then invoke the kernel.
    Call {
        /// The call target.
        kernel: Kernel,
        /// Diagnostic metadata.
        meta: CallMeta,
        /// Argument programs still to evaluate: `(slot, prog)`, where
        /// `None` slots are positional.
        pending: VecDeque<(Option<String>, Prog)>,
        /// The slot currently being evaluated.
        current: Option<String>,
        /// Materialized positional arguments.
        args: Vec<Value>,
        /// Materialized keyword arguments.
        kwargs: Vec<(String, Value)>,
    },
    /// Coordinate gather branches: slots fill as children settle.
    Gather {
        /// Values in input order; `None` while outstanding.
        results: Vec<Option<Value>>,
        /// Children that have not settled yet.
        outstanding: usize,
        /// The branch tasks, for first-error abort.
        children: Vec<TaskId>,
    },
    /// Coordinate race branches: the first settlement wins.
    Race {
        /// The branch tasks, for loser cancellation.
        children: Vec<TaskId>,
    },
}

impl Frame {
    /// A compact label for traces and error snapshots.
    pub fn summary(&self) -> String {
        match self {
            Frame::Bind(_) => "bind".to_string(),
            Frame::Map(_) => "map".to_string(),
            Frame::Handler(h) => format!("handler({})", h.name()),
            Frame::Local { .. } => "local".to_string(),
            Frame::Listen { mark } => format!("listen(mark={mark})"),
            Frame::Safe { .. } => "safe".to_string(),
            Frame::Intercept(_) => "intercept".to_string(),
            Frame::Call { meta, pending, .. } => match (meta.file, meta.line) {
                (Some(file), Some(line)) => {
                    format!("call({} @ {file}:{line}, pending={})", meta.name, pending.len())
                }
                _ => format!("call({}, pending={})", meta.name, pending.len()),
            },
            Frame::Gather { outstanding, .. } => format!("gather(outstanding={outstanding})"),
            Frame::Race { children } => format!("race(n={})", children.len()),
        }
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

/// Render a kontinuation top-first, the way a backtrace reads.
pub(crate) fn summarize(kont: &[Frame]) -> Vec<String> {
    kont.iter().rev().map(Frame::summary).collect()
}
