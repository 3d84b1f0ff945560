//! Effect dispatch: intercept composition and the handler chain walk.

use crate::config::RunConfig;
use crate::kont::Frame;
use crate::step::{StepInfo, StepOutcome};
use crate::task::{Focus, Task};
use axon_core::{
    Branch, Effect, EffectCtx, EffectKind, Handled, Handler, Prog, ResumeToken, Rewrite,
    Transform, VmError, ir,
};
use std::sync::Arc;
use tracing::debug;

/// Dispatch one performed effect through the intercept frames and the
/// handler chain.
pub(crate) fn dispatch(
    task: &mut Task,
    mut effect: Effect,
    root: &[Arc<dyn Handler>],
    config: &RunConfig,
    info: &mut StepInfo,
) -> StepOutcome {
    // Intercept transforms, innermost-first. The first non-None result
    // wins.
    let transforms: Vec<Transform> = task
        .kont
        .iter()
        .rev()
        .filter_map(|frame| match frame {
            Frame::Intercept(t) => Some(t.clone()),
            _ => None,
        })
        .collect();

    for transform in &transforms {
        match transform(&effect.kind) {
            None => continue,
            Some(Rewrite::Effect(kind)) => {
                effect.kind = kind;
                break;
            }
            Some(Rewrite::Prog(replacement)) => {
                info.mode = "intercept:replace".to_string();
                task.focus = Focus::Eval(replacement);
                return StepOutcome::Continue;
            }
        }
    }

    // Program payloads embedded in composite effects still dispatch in
    // child tasks whose kontinuations lack these intercept frames, so
    // the scope travels with them structurally.
    if !transforms.is_empty() {
        rewrap_children(&mut effect.kind, &transforms);
    }

    info.mode = format!("dispatch:{:?}", effect.kind);
    task.last_effect = Some(format!("{effect:?}"));

    // The chain: scope handlers innermost-first, then the root chain
    // (whose last element is innermost).
    let chain: Vec<Arc<dyn Handler>> = task
        .kont
        .iter()
        .rev()
        .filter_map(|frame| match frame {
            Frame::Handler(h) => Some(h.clone()),
            _ => None,
        })
        .chain(root.iter().rev().cloned())
        .collect();

    let token = ResumeToken::new(task.id);
    let env = task.env.clone();
    let store = task.store.clone();
    let mut ctx = EffectCtx::new(&env, &store, task.id, token.clone());

    let mut depth = 0usize;
    for handler in &chain {
        depth += 1;
        info.dispatch_depth = depth;
        if depth > config.max_dispatch_depth {
            task.focus = Focus::Raise(VmError::HandlerProtocol(format!(
                "dispatch depth exceeded {} handlers",
                config.max_dispatch_depth
            )));
            return StepOutcome::Continue;
        }
        match handler.handle(&effect, &mut ctx) {
            Handled::Delegate => continue,
            Handled::Resume(value) => {
                debug!(task = %task.id, handler = handler.name(), "resume");
                task.focus = Focus::Deliver(value);
                return StepOutcome::Continue;
            }
            Handled::Throw(error) => {
                debug!(task = %task.id, handler = handler.name(), %error, "throw");
                task.focus = Focus::Raise(error);
                return StepOutcome::Continue;
            }
            Handled::Run(replacement) => {
                debug!(task = %task.id, handler = handler.name(), "run");
                task.focus = Focus::Eval(replacement);
                return StepOutcome::Continue;
            }
            Handled::Act(actions) => {
                debug!(
                    task = %task.id,
                    handler = handler.name(),
                    actions = actions.len(),
                    "act"
                );
                return StepOutcome::Actions { actions, token };
            }
            _ => unreachable!("Handled has no other variants"),
        }
    }

    task.focus = Focus::Raise(VmError::UnhandledEffect {
        effect: format!("{effect:?}"),
    });
    StepOutcome::Continue
}

/// Wrap every program payload of a composite effect in the active
/// intercept scope. Folding innermost-first wraps the innermost
/// transform closest to the child, so the child consults transforms in
/// the same order the parent would have.
fn rewrap_children(kind: &mut EffectKind, transforms: &[Transform]) {
    let wrap = |prog: &Prog| -> Prog {
        let mut wrapped = prog.clone();
        for transform in transforms {
            wrapped = ir::intercept_with(wrapped, transform.clone());
        }
        wrapped
    };
    match kind {
        EffectKind::Spawn { prog, .. } => *prog = wrap(prog),
        EffectKind::Gather { branches } | EffectKind::Race { branches } => {
            for branch in branches {
                if let Branch::Prog(prog) = branch {
                    *prog = wrap(prog);
                }
            }
        }
        _ => {}
    }
}
