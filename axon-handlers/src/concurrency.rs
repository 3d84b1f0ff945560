//! The concurrency handler: `Spawn`, `Wait`, `Gather`, `Race`, `Cancel`.

use axon_core::{Action, Effect, EffectCtx, EffectKind, Handled, Handler, Value, VmError};

/// Translates concurrency effects into machine actions.
///
/// Everything here crosses task boundaries, so nothing is fulfilled in
/// place: each effect becomes the corresponding [`Action`] and the
/// machine does the bookkeeping (task allocation, join frames, waiter
/// queues, cancellation cleanup).
pub struct ConcurrencyHandler;

impl Handler for ConcurrencyHandler {
    fn handle(&self, effect: &Effect, ctx: &mut EffectCtx<'_>) -> Handled {
        match &effect.kind {
            EffectKind::Spawn { prog, store } => Handled::Act(vec![Action::Spawn {
                prog: prog.clone(),
                store: *store,
                reply: ctx.resume_token(),
            }]),
            EffectKind::Wait { task } => Handled::Act(vec![Action::WaitTask { task: *task }]),
            EffectKind::Gather { branches } => Handled::Act(vec![Action::Gather {
                branches: branches.clone(),
            }]),
            EffectKind::Race { branches } => {
                if branches.is_empty() {
                    return Handled::Throw(VmError::Resource(
                        "race over no branches".to_string(),
                    ));
                }
                Handled::Act(vec![Action::Race {
                    branches: branches.clone(),
                }])
            }
            EffectKind::Cancel { task } => Handled::Act(vec![
                Action::CancelTask { task: *task },
                Action::Wake {
                    token: ctx.resume_token(),
                    result: Ok(Value::Unit),
                },
            ]),
            _ => Handled::Delegate,
        }
    }

    fn name(&self) -> &'static str {
        "concurrency"
    }
}
