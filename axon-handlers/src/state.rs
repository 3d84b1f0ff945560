//! The state handler: `Get`, `Put`, `Modify`.

use axon_core::{Effect, EffectCtx, EffectKind, Handled, Handler, Value, VmError};

/// Fulfills state effects against the performer's store view.
///
/// This handler *implements* store mutation, so it writes through the
/// context's store handle — the one sanctioned exception to the
/// no-side-channel rule of the handler contract.
pub struct StateHandler;

impl Handler for StateHandler {
    fn handle(&self, effect: &Effect, ctx: &mut EffectCtx<'_>) -> Handled {
        match &effect.kind {
            EffectKind::Get { key } => match ctx.store().get(key) {
                Some(value) => Handled::Resume(value),
                None => Handled::Throw(VmError::MissingKey(key.clone())),
            },
            EffectKind::Put { key, value } => {
                ctx.store().put(key.clone(), value.clone());
                Handled::Resume(Value::Unit)
            }
            // One logical transition: the read, the function, and the
            // write happen under a single store lock.
            EffectKind::Modify { key, f } => match ctx.store().update(key, |old| f(old)) {
                Ok(new) => Handled::Resume(new),
                Err(e) => Handled::Throw(e),
            },
            _ => Handled::Delegate,
        }
    }

    fn name(&self) -> &'static str {
        "state"
    }
}
