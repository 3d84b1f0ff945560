//! Probe handlers that record or stub effect dispatch.

use crate::effect::Effect;
use crate::handler::{EffectCtx, Handled, Handler};
use crate::value::Value;
use parking_lot::Mutex;

/// Records a description of every effect it sees, then delegates.
///
/// Install it innermost to observe the dispatch stream without changing
/// program behavior.
#[derive(Default)]
pub struct RecordingHandler {
    seen: Mutex<Vec<String>>,
}

impl RecordingHandler {
    /// A fresh recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptions of the effects seen so far, in dispatch order.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }
}

impl Handler for RecordingHandler {
    fn handle(&self, effect: &Effect, _ctx: &mut EffectCtx<'_>) -> Handled {
        self.seen.lock().push(format!("{:?}", effect.kind));
        Handled::Delegate
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Resumes every effect with one fixed value. Useful for proving that a
/// scoped handler shadows the stack below it.
pub struct StubHandler {
    value: Value,
}

impl StubHandler {
    /// A stub resuming everything with `value`.
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl Handler for StubHandler {
    fn handle(&self, _effect: &Effect, _ctx: &mut EffectCtx<'_>) -> Handled {
        Handled::Resume(self.value.clone())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}
