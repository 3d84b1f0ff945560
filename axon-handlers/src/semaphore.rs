//! The semaphore handler: `SemCreate`, `SemAcquire`, `SemRelease`.

use axon_core::{
    Action, Effect, EffectCtx, EffectKind, Handled, Handler, ParkReason, Value,
};

/// Fulfills semaphore effects against the handle itself.
///
/// The semaphore's state lives in the handle, so acquire and release
/// operate on it directly; only creation goes through the machine (to
/// mint a monotonic id) and only a blocked acquire parks. Waiters
/// resume in the exact order their acquisitions blocked.
pub struct SemaphoreHandler;

impl Handler for SemaphoreHandler {
    fn handle(&self, effect: &Effect, ctx: &mut EffectCtx<'_>) -> Handled {
        match &effect.kind {
            EffectKind::SemCreate { permits } => Handled::Act(vec![Action::CreateSemaphore {
                permits: *permits,
                reply: ctx.resume_token(),
            }]),
            EffectKind::SemAcquire { sem } => {
                if sem.try_acquire() {
                    Handled::Resume(Value::Unit)
                } else {
                    tracing::trace!(sem = %sem.id(), task = %ctx.task(), "acquire blocked");
                    sem.enqueue_waiter(ctx.resume_token());
                    Handled::Act(vec![Action::Park {
                        reason: ParkReason::Semaphore(sem.clone()),
                    }])
                }
            }
            EffectKind::SemRelease { sem } => match sem.release() {
                Err(error) => Handled::Throw(error),
                // The permit transfers straight to the longest waiter.
                Ok(Some(waiter)) => Handled::Act(vec![
                    Action::Wake {
                        token: waiter,
                        result: Ok(Value::Unit),
                    },
                    Action::Wake {
                        token: ctx.resume_token(),
                        result: Ok(Value::Unit),
                    },
                ]),
                Ok(None) => Handled::Resume(Value::Unit),
            },
            _ => Handled::Delegate,
        }
    }

    fn name(&self) -> &'static str {
        "semaphore"
    }
}
