//! Single-shot continuation enforcement through the full dispatch path.

mod common;

use axon_core::{
    Action, Effect, EffectCtx, EffectKind, Handled, Handler, Value, VmError, fx,
};
use axon_core::{Env, Store};
use common::run_with;
use axon_vm::RunConfig;
use std::sync::Arc;

/// A buggy handler that wakes the performer's continuation twice.
struct DoubleResume;

impl Handler for DoubleResume {
    fn handle(&self, effect: &Effect, ctx: &mut EffectCtx<'_>) -> Handled {
        let EffectKind::Custom { .. } = &effect.kind else {
            return Handled::Delegate;
        };
        Handled::Act(vec![
            Action::Wake {
                token: ctx.resume_token(),
                result: Ok(Value::Int(1)),
            },
            Action::Wake {
                token: ctx.resume_token(),
                result: Ok(Value::Int(2)),
            },
        ])
    }

    fn name(&self) -> &'static str {
        "double-resume"
    }
}

#[test]
fn waking_a_continuation_twice_raises_already_resumed() {
    let report = run_with(
        fx::custom("poke", Value::Unit),
        vec![Arc::new(DoubleResume)],
        Env::new(),
        Store::new(),
        RunConfig::default(),
    );
    assert_eq!(report.result, Err(VmError::AlreadyResumed));
}

/// A correct handler that wakes the performer exactly once.
struct SingleResume;

impl Handler for SingleResume {
    fn handle(&self, effect: &Effect, ctx: &mut EffectCtx<'_>) -> Handled {
        let EffectKind::Custom { .. } = &effect.kind else {
            return Handled::Delegate;
        };
        Handled::Act(vec![Action::Wake {
            token: ctx.resume_token(),
            result: Ok(Value::Int(7)),
        }])
    }

    fn name(&self) -> &'static str {
        "single-resume"
    }
}

#[test]
fn a_single_wake_resumes_normally() {
    let report = run_with(
        fx::custom("poke", Value::Unit),
        vec![Arc::new(SingleResume)],
        Env::new(),
        Store::new(),
        RunConfig::default(),
    );
    assert_eq!(report.result, Ok(Value::Int(7)));
}

/// A handler that issues no actions at all: the performer would hang
/// forever, which the machine reports as a protocol violation.
struct SilentHandler;

impl Handler for SilentHandler {
    fn handle(&self, effect: &Effect, _ctx: &mut EffectCtx<'_>) -> Handled {
        let EffectKind::Custom { .. } = &effect.kind else {
            return Handled::Delegate;
        };
        Handled::Act(vec![])
    }

    fn name(&self) -> &'static str {
        "silent"
    }
}

#[test]
fn a_dispatch_with_no_wake_is_a_protocol_error() {
    let report = run_with(
        fx::custom("poke", Value::Unit),
        vec![Arc::new(SilentHandler)],
        Env::new(),
        Store::new(),
        RunConfig::default(),
    );
    assert!(matches!(report.result, Err(VmError::HandlerProtocol(_))));
}
