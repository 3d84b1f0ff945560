//! The control IR: the instruction tree the machine evaluates.
//!
//! Programs are built directly by the combinator functions in this
//! module ([`pure`], [`bind`], [`map`], [`seq`], …). There is no
//! generator or do-notation front end; a node describes an instruction,
//! not a value, and the machine reduces one node per step.
//!
//! Every function embedded in a node (`Map`/`FlatMap`/`Intercept`
//! closures, call kernels) is pure with respect to machine state by
//! contract: it may compute, it must not mutate the environment or the
//! store. All mutation goes through performed effects.

use crate::effect::{Effect, EffectKind};
use crate::error::VmError;
use crate::handler::Handler;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// A shared, immutable program. Nodes are cheap to share; a `Prog` in
/// two places is the same tree, never a copy.
pub type Prog = Arc<Ctrl>;

/// A pure function applied to a delivered value (`Map` nodes).
pub type MapFn = Arc<dyn Fn(Value) -> Result<Value, VmError> + Send + Sync>;

/// A pure function producing the continuation program (`FlatMap` nodes).
pub type BindFn = Arc<dyn Fn(Value) -> Result<Prog, VmError> + Send + Sync>;

/// A call target: receives materialized arguments, returns the body.
pub type Kernel = Arc<dyn Fn(CallArgs) -> Result<Prog, VmError> + Send + Sync>;

/// An effect rewrite installed by an `Intercept` node.
///
/// Returning `None` leaves the effect unchanged for the next transform
/// out; the first non-`None` result in the innermost-first chain wins.
pub type Transform = Arc<dyn Fn(&EffectKind) -> Option<Rewrite> + Send + Sync>;

/// What an intercept transform turned an effect into.
#[derive(Clone)]
pub enum Rewrite {
    /// A rewritten effect, dispatched in place of the original.
    Effect(EffectKind),
    /// A replacement program, evaluated in place of the perform.
    Prog(Prog),
}

/// Materialized arguments handed to a call kernel, in source order.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    /// Positional argument values.
    pub args: Vec<Value>,
    /// Keyword argument values, in declaration order.
    pub kwargs: Vec<(String, Value)>,
}

impl CallArgs {
    /// Positional argument `i`, if present.
    pub fn arg(&self, i: usize) -> Option<&Value> {
        self.args.get(i)
    }

    /// Keyword argument by name, if present.
    pub fn kwarg(&self, name: &str) -> Option<&Value> {
        self.kwargs
            .iter()
            .find_map(|(k, v)| (k == name).then_some(v))
    }
}

/// Call-site metadata, attached to the call frame for diagnostics.
/// Never semantic.
#[derive(Debug, Clone, Default)]
pub struct CallMeta {
    /// The called function's name.
    pub name: String,
    /// Source file of the call site, if known.
    pub file: Option<&'static str>,
    /// Source line of the call site, if known.
    pub line: Option<u32>,
}

impl CallMeta {
    /// Metadata carrying just a function name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: None,
            line: None,
        }
    }
}

/// One node of the control IR.
#[non_exhaustive]
#[derive(Clone)]
pub enum Ctrl {
    /// Yield a value with no side effect.
    Pure(Value),
    /// Request an effect via the handler stack.
    Perform(Effect),
    /// Evaluate `inner`, apply a pure function to its value.
    Map {
        /// The program whose value is transformed.
        inner: Prog,
        /// The pure transformation.
        f: MapFn,
    },
    /// Monadic bind: evaluate `inner`, continue with `f(value)`.
    FlatMap {
        /// The program whose value feeds the continuation.
        inner: Prog,
        /// The continuation builder.
        f: BindFn,
    },
    /// Lazy call: evaluate argument programs left-to-right, then invoke
    /// the kernel with the materialized values.
    Call {
        /// The call target.
        kernel: Kernel,
        /// Positional argument programs.
        args: Vec<Prog>,
        /// Keyword argument programs, in declaration order.
        kwargs: Vec<(String, Prog)>,
        /// Diagnostic call-site metadata.
        meta: CallMeta,
    },
    /// Push a handler as innermost for `inner`'s scope.
    WithHandler {
        /// The scoped handler.
        handler: Arc<dyn Handler>,
        /// The program it scopes over.
        inner: Prog,
    },
    /// Scope a reader override over `inner`; the environment restores on
    /// exit, success or error.
    Local {
        /// Bindings layered over the current environment.
        delta: Vec<(String, Value)>,
        /// The program evaluated under the extended environment.
        inner: Prog,
    },
    /// Capture `inner`'s writer output into a [`crate::ListenResult`]
    /// on success; on error the captures are discarded and the error
    /// propagates intact.
    Listen {
        /// The observed program.
        inner: Prog,
    },
    /// Reify `inner`'s outcome: success becomes `Ok`, a raised error
    /// becomes `Err`. The environment restores on exit; the store does
    /// not roll back.
    Safe {
        /// The guarded program.
        inner: Prog,
    },
    /// Structurally rewrite effects performed during `inner`.
    Intercept {
        /// The program whose effects are rewritten.
        inner: Prog,
        /// The rewrite function.
        transform: Transform,
    },
}

impl Ctrl {
    /// A short tag naming the node kind, for traces and errors.
    pub fn tag(&self) -> &'static str {
        match self {
            Ctrl::Pure(_) => "pure",
            Ctrl::Perform(_) => "perform",
            Ctrl::Map { .. } => "map",
            Ctrl::FlatMap { .. } => "flat_map",
            Ctrl::Call { .. } => "call",
            Ctrl::WithHandler { .. } => "with_handler",
            Ctrl::Local { .. } => "local",
            Ctrl::Listen { .. } => "listen",
            Ctrl::Safe { .. } => "safe",
            Ctrl::Intercept { .. } => "intercept",
        }
    }
}

impl fmt::Debug for Ctrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ctrl::Pure(v) => f.debug_tuple("Pure").field(v).finish(),
            Ctrl::Perform(e) => f.debug_tuple("Perform").field(e).finish(),
            Ctrl::Map { inner, .. } => f.debug_struct("Map").field("inner", inner).finish(),
            Ctrl::FlatMap { inner, .. } => {
                f.debug_struct("FlatMap").field("inner", inner).finish()
            }
            Ctrl::Call { args, kwargs, meta, .. } => f
                .debug_struct("Call")
                .field("name", &meta.name)
                .field("args", &args.len())
                .field("kwargs", &kwargs.len())
                .finish(),
            Ctrl::WithHandler { handler, inner } => f
                .debug_struct("WithHandler")
                .field("handler", &handler.name())
                .field("inner", inner)
                .finish(),
            Ctrl::Local { delta, inner } => f
                .debug_struct("Local")
                .field("delta", &delta.iter().map(|(k, _)| k).collect::<Vec<_>>())
                .field("inner", inner)
                .finish(),
            Ctrl::Listen { inner } => f.debug_struct("Listen").field("inner", inner).finish(),
            Ctrl::Safe { inner } => f.debug_struct("Safe").field("inner", inner).finish(),
            Ctrl::Intercept { inner, .. } => {
                f.debug_struct("Intercept").field("inner", inner).finish()
            }
        }
    }
}

/// Lift a value into a program.
pub fn pure(value: impl Into<Value>) -> Prog {
    Arc::new(Ctrl::Pure(value.into()))
}

/// A program that raises an error when evaluated.
pub fn fail(error: VmError) -> Prog {
    try_map(pure(()), move |_| Err(error.clone()))
}

/// Perform an effect.
pub fn perform(effect: Effect) -> Prog {
    Arc::new(Ctrl::Perform(effect))
}

/// Apply a pure function to a program's value.
pub fn map(inner: Prog, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Prog {
    try_map(inner, move |v| Ok(f(v)))
}

/// Apply a fallible pure function to a program's value.
pub fn try_map(
    inner: Prog,
    f: impl Fn(Value) -> Result<Value, VmError> + Send + Sync + 'static,
) -> Prog {
    Arc::new(Ctrl::Map {
        inner,
        f: Arc::new(f),
    })
}

/// Monadic bind.
pub fn bind(inner: Prog, f: impl Fn(Value) -> Prog + Send + Sync + 'static) -> Prog {
    try_bind(inner, move |v| Ok(f(v)))
}

/// Monadic bind whose continuation builder may fail.
pub fn try_bind(
    inner: Prog,
    f: impl Fn(Value) -> Result<Prog, VmError> + Send + Sync + 'static,
) -> Prog {
    Arc::new(Ctrl::FlatMap {
        inner,
        f: Arc::new(f),
    })
}

/// Run `first`, discard its value, then run `second`.
pub fn seq(first: Prog, second: Prog) -> Prog {
    bind(first, move |_| second.clone())
}

/// Run programs in order, collecting their values into a list.
pub fn collect(progs: Vec<Prog>) -> Prog {
    fn go(mut rest: std::vec::IntoIter<Prog>, acc: Vec<Value>) -> Prog {
        match rest.next() {
            None => pure(Value::List(acc)),
            Some(p) => bind(p, move |v| {
                let mut acc = acc.clone();
                acc.push(v);
                go(rest.clone(), acc)
            }),
        }
    }
    go(progs.into_iter(), Vec::new())
}

/// Scope reader overrides over a program.
pub fn local<K, V>(delta: impl IntoIterator<Item = (K, V)>, inner: Prog) -> Prog
where
    K: Into<String>,
    V: Into<Value>,
{
    Arc::new(Ctrl::Local {
        delta: delta
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
        inner,
    })
}

/// Capture a program's writer output on success.
pub fn listen(inner: Prog) -> Prog {
    Arc::new(Ctrl::Listen { inner })
}

/// Reify a program's outcome as `Ok` / `Err`.
pub fn safe(inner: Prog) -> Prog {
    Arc::new(Ctrl::Safe { inner })
}

/// Rewrite effects performed during a program.
pub fn intercept(
    inner: Prog,
    transform: impl Fn(&EffectKind) -> Option<Rewrite> + Send + Sync + 'static,
) -> Prog {
    Arc::new(Ctrl::Intercept {
        inner,
        transform: Arc::new(transform),
    })
}

/// Rewrite effects with an already-shared transform. Used by the
/// dispatcher to rewrap composite-effect children; program authors
/// usually want [`intercept`].
pub fn intercept_with(inner: Prog, transform: Transform) -> Prog {
    Arc::new(Ctrl::Intercept { inner, transform })
}

/// Push a handler as innermost for a program's scope.
pub fn with_handler(handler: Arc<dyn Handler>, inner: Prog) -> Prog {
    Arc::new(Ctrl::WithHandler { handler, inner })
}

/// Build a lazy call node.
pub fn call(
    kernel: impl Fn(CallArgs) -> Result<Prog, VmError> + Send + Sync + 'static,
    args: Vec<Prog>,
    kwargs: Vec<(String, Prog)>,
    meta: CallMeta,
) -> Prog {
    Arc::new(Ctrl::Call {
        kernel: Arc::new(kernel),
        args,
        kwargs,
        meta,
    })
}
