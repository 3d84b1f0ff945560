//! The writer handler: `Tell`.

use axon_core::{Effect, EffectCtx, EffectKind, Handled, Handler, Value};

/// Appends `Tell` entries to the reserved `__log__` list in the store.
///
/// Capturing a scope's output is the `Listen` IR frame's job, not a
/// handler's: the frame marks the log length on entry and slices the
/// tail on a successful exit. Entries themselves always persist —
/// `Listen` observes the log, it does not own it.
pub struct WriterHandler;

impl Handler for WriterHandler {
    fn handle(&self, effect: &Effect, ctx: &mut EffectCtx<'_>) -> Handled {
        let EffectKind::Tell { entry } = &effect.kind else {
            return Handled::Delegate;
        };
        ctx.store().append_log(entry.clone());
        Handled::Resume(Value::Unit)
    }

    fn name(&self) -> &'static str {
        "writer"
    }
}
