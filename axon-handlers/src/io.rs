//! The io handler: `Io` thunks and external `Await`.

use axon_core::{Action, Effect, EffectCtx, EffectKind, Handled, Handler};

/// Fulfills interactions with the world outside the machine.
///
/// `Io` thunks run synchronously right here, on the driver thread: from
/// the task's perspective io is atomic and non-suspending, under every
/// driver. `Await` is the opposite — it always parks the performer and
/// surfaces the future to the driver's event loop.
pub struct IoHandler;

impl Handler for IoHandler {
    fn handle(&self, effect: &Effect, _ctx: &mut EffectCtx<'_>) -> Handled {
        match &effect.kind {
            EffectKind::Io { thunk } => match thunk() {
                Ok(value) => Handled::Resume(value),
                Err(error) => Handled::Throw(error),
            },
            EffectKind::Await { future } => Handled::Act(vec![Action::AwaitExternal {
                future: future.clone(),
            }]),
            _ => Handled::Delegate,
        }
    }

    fn name(&self) -> &'static str {
        "io"
    }
}
