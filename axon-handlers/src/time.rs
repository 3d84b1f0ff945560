//! The time handler: `GetTime`, `Delay`, `WaitUntil`.

use axon_core::{Action, Effect, EffectCtx, EffectKind, Handled, Handler};

/// Fulfills clock effects through scheduler actions.
///
/// Handlers never read the clock themselves — the machine resolves
/// "now" against whichever scheduler is installed, which is what lets
/// the same program run under simulated or wall time.
pub struct TimeHandler;

impl Handler for TimeHandler {
    fn handle(&self, effect: &Effect, ctx: &mut EffectCtx<'_>) -> Handled {
        match &effect.kind {
            EffectKind::GetTime => Handled::Act(vec![Action::GetTime {
                reply: ctx.resume_token(),
            }]),
            EffectKind::Delay { duration } => Handled::Act(vec![Action::ScheduleAfter {
                delay: *duration,
            }]),
            EffectKind::WaitUntil { deadline } => Handled::Act(vec![Action::ScheduleAt {
                wake_at: *deadline,
            }]),
            _ => Handled::Delegate,
        }
    }

    fn name(&self) -> &'static str {
        "time"
    }
}
