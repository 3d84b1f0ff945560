//! Run reports: what a driver returns when a program settles.

use crate::error::VmError;
use crate::id::TaskId;
use crate::value::Value;
use serde::Serialize;
use std::collections::BTreeMap;

/// One step-engine transition, recorded when tracing is enabled.
#[derive(Debug, Clone, Serialize)]
pub struct StepEvent {
    /// Global step counter across all tasks.
    pub step: u64,
    /// The task that stepped.
    pub task: TaskId,
    /// What the step did: `eval:<node>`, `deliver`, `raise`, or
    /// `dispatch:<effect>`.
    pub mode: String,
    /// Tasks ready to run after this step.
    pub pending: usize,
    /// Handlers consulted while dispatching, zero outside dispatch.
    pub dispatch_depth: usize,
    /// A compact rendering of the task's kontinuation.
    pub frame_summary: String,
}

/// The outcome of a run.
#[derive(Debug)]
pub struct RunReport {
    /// The root program's terminal value or error.
    pub result: Result<Value, VmError>,
    /// The final store, including reserved keys (`__log__`, `__clock__`).
    pub store: BTreeMap<String, Value>,
    /// Step events, if tracing was enabled.
    pub trace: Option<Vec<StepEvent>>,
    /// The root task's kontinuation at the point of failure.
    pub k_stack_on_error: Option<Vec<String>>,
    /// The effect dispatch chain at the point of failure.
    pub effect_stack_on_error: Option<Vec<String>>,
}

impl RunReport {
    /// The terminal value, panicking on a failed run. Test convenience.
    pub fn value(&self) -> &Value {
        match &self.result {
            Ok(v) => v,
            Err(e) => panic!("run failed: {e}"),
        }
    }

    /// The terminal error, panicking on a successful run. Test
    /// convenience.
    pub fn error(&self) -> &VmError {
        match &self.result {
            Ok(v) => panic!("run succeeded with {v:?}"),
            Err(e) => e,
        }
    }

    /// A store cell from the final snapshot.
    pub fn cell(&self, key: &str) -> Option<&Value> {
        self.store.get(key)
    }
}
