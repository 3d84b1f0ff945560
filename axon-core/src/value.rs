//! Runtime values produced and consumed by programs.

use crate::error::VmError;
use crate::id::TaskId;
use crate::ir::Prog;
use crate::sem::Semaphore;
use std::fmt;
use std::sync::Arc;

/// The value sum type of the virtual machine.
///
/// Plain data variants (`Bool` through `Json`) cover what ordinary
/// programs compute with; the handle variants (`Prog`, `Task`, `Sem`)
/// let values refer back into the engine — a reified program for lazy
/// reader bindings and spawn payloads, a task handle for `Wait` /
/// `Cancel`, a semaphore handle for acquire/release.
///
/// `Ok` / `Err` are produced by `Safe` frames, `Captured` by `Listen`
/// frames.
#[non_exhaustive]
#[derive(Clone, Default)]
pub enum Value {
    /// The unit value, produced by effects with nothing to report.
    #[default]
    Unit,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A double-precision float.
    Float(f64),
    /// An immutable string.
    Str(Arc<str>),
    /// An ordered list of values.
    List(Vec<Value>),
    /// An arbitrary JSON payload.
    Json(serde_json::Value),
    /// A reified program.
    Prog(Prog),
    /// A handle to a spawned task.
    Task(TaskId),
    /// A handle to a semaphore.
    Sem(Semaphore),
    /// A success reified by a `Safe` frame.
    Ok(Box<Value>),
    /// A failure reified by a `Safe` frame.
    Err(Box<VmError>),
    /// The value-plus-log pair produced by a `Listen` frame.
    Captured(Box<ListenResult>),
}

/// The result of a successful `Listen` frame: the inner program's value
/// together with the writer entries it appended.
#[derive(Debug, Clone, PartialEq)]
pub struct ListenResult {
    /// The inner program's value.
    pub value: Value,
    /// Writer entries appended while the frame was active.
    pub log: Vec<Value>,
}

impl Value {
    /// Wrap a value as `Safe` success.
    pub fn ok(value: Value) -> Self {
        Value::Ok(Box::new(value))
    }

    /// Wrap an error as `Safe` failure.
    pub fn err(error: VmError) -> Self {
        Value::Err(Box::new(error))
    }

    /// Build a string value.
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    /// The integer inside, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The string inside, if this is a `Str`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean inside, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The list inside, if this is a `List`.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// The task handle inside, if this is a `Task`.
    pub fn as_task(&self) -> Option<TaskId> {
        match self {
            Value::Task(id) => Some(*id),
            _ => None,
        }
    }

    /// The semaphore handle inside, if this is a `Sem`.
    pub fn as_sem(&self) -> Option<&Semaphore> {
        match self {
            Value::Sem(sem) => Some(sem),
            _ => None,
        }
    }

    /// True for the unit value.
    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }

    /// A short tag naming the variant, for diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Json(_) => "json",
            Value::Prog(_) => "prog",
            Value::Task(_) => "task",
            Value::Sem(_) => "sem",
            Value::Ok(_) => "ok",
            Value::Err(_) => "err",
            Value::Captured(_) => "captured",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            // Programs have no structural equality; compare by identity.
            (Value::Prog(a), Value::Prog(b)) => Arc::ptr_eq(a, b),
            (Value::Task(a), Value::Task(b)) => a == b,
            (Value::Sem(a), Value::Sem(b)) => a.id() == b.id(),
            (Value::Ok(a), Value::Ok(b)) => a == b,
            (Value::Err(a), Value::Err(b)) => a == b,
            (Value::Captured(a), Value::Captured(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "Unit"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Json(v) => write!(f, "Json({v})"),
            Value::Prog(_) => write!(f, "Prog(..)"),
            Value::Task(id) => write!(f, "Task({id})"),
            Value::Sem(sem) => write!(f, "Sem({})", sem.id()),
            Value::Ok(v) => f.debug_tuple("Ok").field(v).finish(),
            Value::Err(e) => f.debug_tuple("Err").field(e).finish(),
            Value::Captured(r) => f.debug_tuple("Captured").field(r).finish(),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s.as_str()))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl From<TaskId> for Value {
    fn from(id: TaskId) -> Self {
        Value::Task(id)
    }
}

impl From<Semaphore> for Value {
    fn from(sem: Semaphore) -> Self {
        Value::Sem(sem)
    }
}
