//! Step-engine semantics: reduction rules, frames, and dispatch.

mod common;

use axon_core::test_utils::{RecordingHandler, StubHandler};
use axon_core::{
    CallMeta, Env, EffectKind, ListenResult, Rewrite, Store, Value, VmError, fx, ir,
};
use axon_vm::RunConfig;
use common::{run, run_with};
use std::sync::Arc;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Pure reduction and the monad/functor laws (concrete cases;
// proptest_laws.rs covers random inputs)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn pure_yields_its_value() {
    assert_eq!(run(ir::pure(42)).result, Ok(Value::Int(42)));
}

#[test]
fn map_applies_pure_function() {
    let prog = ir::map(ir::pure(2), |v| match v {
        Value::Int(n) => Value::Int(n + 1),
        other => other,
    });
    assert_eq!(run(prog).result, Ok(Value::Int(3)));
}

#[test]
fn bind_left_identity() {
    let f = |v: Value| match v {
        Value::Int(n) => ir::pure(n * 10),
        other => ir::pure(other),
    };
    let lhs = run(ir::bind(ir::pure(4), f)).result;
    let rhs = run(f(Value::Int(4))).result;
    assert_eq!(lhs, rhs);
}

#[test]
fn bind_right_identity_over_effects() {
    let m = || ir::seq(fx::put("k", 5), fx::get("k"));
    let lhs = run(ir::bind(m(), ir::pure)).result;
    let rhs = run(m()).result;
    assert_eq!(lhs, rhs);
}

#[test]
fn bind_associativity_over_effects() {
    let m = || ir::seq(fx::put("k", 1), fx::get("k"));
    let f = |v: Value| {
        let n = v.as_int().unwrap_or(0);
        ir::seq(fx::put("k", n + 1), fx::get("k"))
    };
    let g = |v: Value| {
        let n = v.as_int().unwrap_or(0);
        ir::pure(n * 100)
    };
    let lhs = run(ir::bind(ir::bind(m(), f), g)).result;
    let rhs = run(ir::bind(m(), move |x| ir::bind(f(x), g))).result;
    assert_eq!(lhs, rhs);
    assert_eq!(lhs, Ok(Value::Int(200)));
}

#[test]
fn map_error_propagates() {
    let prog = ir::try_map(ir::pure(1), |_| Err(VmError::user("bad map")));
    assert_eq!(run(prog).result, Err(VmError::User("bad map".to_string())));
}

#[test]
fn fail_raises() {
    assert_eq!(
        run(ir::fail(VmError::user("boom"))).result,
        Err(VmError::User("boom".to_string()))
    );
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Call nodes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn call_materializes_args_in_order_then_invokes_kernel() {
    let arg = |i: i64| ir::seq(fx::tell(i), ir::pure(i));
    let prog = ir::call(
        |call| {
            let sum: i64 = call.args.iter().filter_map(Value::as_int).sum();
            Ok(ir::pure(sum))
        },
        vec![arg(1), arg(2), arg(3)],
        vec![],
        CallMeta::named("sum"),
    );
    let report = run(ir::collect(vec![prog, fx::get("__log__")]));
    let Ok(Value::List(items)) = &report.result else {
        panic!("unexpected result: {:?}", report.result);
    };
    assert_eq!(items[0], Value::Int(6));
    // Arguments were evaluated left-to-right.
    assert_eq!(
        items[1],
        Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    );
}

#[test]
fn call_kwargs_reach_the_kernel_by_name() {
    let prog = ir::call(
        |call| {
            let base = call.arg(0).and_then(Value::as_int).unwrap_or(0);
            let scale = call.kwarg("scale").and_then(Value::as_int).unwrap_or(1);
            Ok(ir::pure(base * scale))
        },
        vec![ir::pure(6)],
        vec![("scale".to_string(), ir::pure(7))],
        CallMeta::named("scaled"),
    );
    assert_eq!(run(prog).result, Ok(Value::Int(42)));
}

#[test]
fn kernel_error_raises_in_the_caller() {
    let prog = ir::safe(ir::call(
        |_| Err(VmError::user("kernel refused")),
        vec![],
        vec![],
        CallMeta::named("refusing"),
    ));
    assert_eq!(
        run(prog).result,
        Ok(Value::err(VmError::User("kernel refused".to_string())))
    );
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Local / Safe / Listen frames
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn local_overrides_and_restores() {
    let prog = ir::collect(vec![
        fx::ask("x"),
        ir::local([("x", "inner")], fx::ask("x")),
        fx::ask("x"),
    ]);
    let env: Env = [("x", "outer")].into_iter().collect();
    let report = run_with(prog, vec![], env, Store::new(), RunConfig::default());
    assert_eq!(
        report.result,
        Ok(Value::List(vec![
            Value::from("outer"),
            Value::from("inner"),
            Value::from("outer"),
        ]))
    );
}

#[test]
fn local_restores_across_an_error() {
    let prog = ir::collect(vec![
        ir::safe(ir::local(
            [("x", "inner")],
            ir::fail(VmError::user("inside")),
        )),
        fx::ask("x"),
    ]);
    let env: Env = [("x", "outer")].into_iter().collect();
    let report = run_with(prog, vec![], env, Store::new(), RunConfig::default());
    assert_eq!(
        report.result,
        Ok(Value::List(vec![
            Value::err(VmError::User("inside".to_string())),
            Value::from("outer"),
        ]))
    );
}

#[test]
fn safe_reifies_success_and_failure() {
    assert_eq!(
        run(ir::safe(ir::pure(1))).result,
        Ok(Value::ok(Value::Int(1)))
    );
    assert_eq!(
        run(ir::safe(ir::fail(VmError::user("x")))).result,
        Ok(Value::err(VmError::User("x".to_string())))
    );
}

#[test]
fn safe_does_not_roll_back_the_store() {
    let prog = ir::collect(vec![
        ir::seq(
            fx::put("n", 0),
            ir::safe(ir::seq(fx::put("n", 1), ir::fail(VmError::user("boom")))),
        ),
        fx::get("n"),
    ]);
    let report = run(prog);
    let Ok(Value::List(items)) = &report.result else {
        panic!("unexpected result: {:?}", report.result);
    };
    assert_eq!(items[0], Value::err(VmError::User("boom".to_string())));
    assert_eq!(items[1], Value::Int(1));
    assert_eq!(report.cell("n"), Some(&Value::Int(1)));
}

#[test]
fn listen_captures_scope_output_on_success() {
    let prog = ir::listen(ir::seq(fx::tell("a"), ir::pure(42)));
    assert_eq!(
        run(prog).result,
        Ok(Value::Captured(Box::new(ListenResult {
            value: Value::Int(42),
            log: vec![Value::from("a")],
        })))
    );
}

#[test]
fn listen_captures_only_its_own_scope() {
    let prog = ir::seq(
        fx::tell("before"),
        ir::listen(ir::seq(fx::tell("inside"), ir::pure(()))),
    );
    assert_eq!(
        run(prog).result,
        Ok(Value::Captured(Box::new(ListenResult {
            value: Value::Unit,
            log: vec![Value::from("inside")],
        })))
    );
}

#[test]
fn listen_discards_captures_on_error_but_the_log_persists() {
    let prog = ir::safe(ir::listen(ir::seq(
        fx::tell("a"),
        ir::fail(VmError::user("x")),
    )));
    let report = run(prog);
    assert_eq!(report.result, Ok(Value::err(VmError::User("x".to_string()))));
    assert_eq!(
        report.cell("__log__"),
        Some(&Value::List(vec![Value::from("a")]))
    );
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Handler scoping and delegation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn scoped_handler_shadows_the_root_stack() {
    let prog = ir::collect(vec![
        ir::with_handler(Arc::new(StubHandler::new(Value::from("stubbed"))), fx::ask("x")),
        fx::ask("x"),
    ]);
    let env: Env = [("x", "real")].into_iter().collect();
    let report = run_with(prog, vec![], env, Store::new(), RunConfig::default());
    assert_eq!(
        report.result,
        Ok(Value::List(vec![
            Value::from("stubbed"),
            Value::from("real"),
        ]))
    );
}

#[test]
fn delegation_passes_through_to_outer_handlers() {
    let recorder = Arc::new(RecordingHandler::new());
    let prog = ir::with_handler(recorder.clone(), ir::seq(fx::put("k", 1), fx::get("k")));
    let report = run(prog);
    assert_eq!(report.result, Ok(Value::Int(1)));
    // The recorder saw both effects and delegated both.
    assert_eq!(recorder.seen(), vec!["Put(k, Int(1))", "Get(k)"]);
}

#[test]
fn exhausted_chain_is_an_unhandled_effect() {
    let report = run(fx::custom("frobnicate", Value::Unit));
    match report.result {
        Err(VmError::UnhandledEffect { effect }) => {
            assert!(effect.contains("frobnicate"), "effect was {effect}");
        }
        other => panic!("expected UnhandledEffect, got {other:?}"),
    }
}

#[test]
fn dispatch_depth_bound_catches_delegation_loops() {
    let prog = ir::with_handler(
        Arc::new(RecordingHandler::new()),
        ir::with_handler(
            Arc::new(RecordingHandler::new()),
            ir::with_handler(Arc::new(RecordingHandler::new()), fx::get("missing")),
        ),
    );
    let config = RunConfig {
        max_dispatch_depth: 2,
        ..RunConfig::default()
    };
    let report = run_with(prog, vec![], Env::new(), Store::new(), config);
    assert!(matches!(report.result, Err(VmError::HandlerProtocol(_))));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Intercept
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn intercept_rewrites_an_effect() {
    // Every Ask is served from the store instead of the env.
    let prog = ir::intercept(fx::ask("x"), |kind| match kind {
        EffectKind::Ask { key } => Some(Rewrite::Effect(EffectKind::Get { key: key.clone() })),
        _ => None,
    });
    let store: Store = [("x", "from-store")].into_iter().collect();
    let report = run_with(prog, vec![], Env::new(), store, RunConfig::default());
    assert_eq!(report.result, Ok(Value::from("from-store")));
}

#[test]
fn intercept_replaces_with_a_program() {
    let prog = ir::intercept(fx::ask("x"), |kind| match kind {
        EffectKind::Ask { .. } => Some(Rewrite::Prog(ir::pure("intercepted"))),
        _ => None,
    });
    assert_eq!(run(prog).result, Ok(Value::from("intercepted")));
}

#[test]
fn innermost_intercept_wins() {
    let outer = |kind: &EffectKind| match kind {
        EffectKind::Ask { .. } => Some(Rewrite::Prog(ir::pure("outer"))),
        _ => None,
    };
    let inner = |kind: &EffectKind| match kind {
        EffectKind::Ask { .. } => Some(Rewrite::Prog(ir::pure("inner"))),
        _ => None,
    };
    let prog = ir::intercept(ir::intercept(fx::ask("x"), inner), outer);
    assert_eq!(run(prog).result, Ok(Value::from("inner")));
}

#[test]
fn none_falls_through_to_the_next_transform_out() {
    let outer = |kind: &EffectKind| match kind {
        EffectKind::Ask { .. } => Some(Rewrite::Prog(ir::pure("outer"))),
        _ => None,
    };
    let inner = |_: &EffectKind| None;
    let prog = ir::intercept(ir::intercept(fx::ask("x"), inner), outer);
    assert_eq!(run(prog).result, Ok(Value::from("outer")));
}

#[test]
fn intercept_scope_ends_with_the_frame() {
    let prog = ir::collect(vec![
        ir::intercept(fx::ask("x"), |kind| match kind {
            EffectKind::Ask { .. } => Some(Rewrite::Prog(ir::pure("rewritten"))),
            _ => None,
        }),
        fx::ask("x"),
    ]);
    let env: Env = [("x", "real")].into_iter().collect();
    let report = run_with(prog, vec![], env, Store::new(), RunConfig::default());
    assert_eq!(
        report.result,
        Ok(Value::List(vec![
            Value::from("rewritten"),
            Value::from("real"),
        ]))
    );
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Reader laziness
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn lazy_env_binding_is_forced_once_and_memoized() {
    let lazy = Value::Prog(ir::seq(fx::tell("forced"), ir::pure(5)));
    let env = Env::new().with([("x", lazy)]);
    let prog = ir::collect(vec![fx::ask("x"), fx::ask("x")]);
    let report = run_with(prog, vec![], env, Store::new(), RunConfig::default());
    assert_eq!(
        report.result,
        Ok(Value::List(vec![Value::Int(5), Value::Int(5)]))
    );
    // Forced exactly once.
    assert_eq!(
        report.cell("__log__"),
        Some(&Value::List(vec![Value::from("forced")]))
    );
    assert_eq!(report.cell("__memo__/x"), Some(&Value::Int(5)));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Safety bounds and traces
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn runaway_programs_hit_the_step_budget() {
    fn forever() -> axon_core::Prog {
        ir::bind(ir::pure(()), |_| forever())
    }
    let config = RunConfig {
        max_steps: Some(500),
        ..RunConfig::default()
    };
    let report = run_with(forever(), vec![], Env::new(), Store::new(), config);
    assert!(matches!(report.result, Err(VmError::Resource(_))));
}

#[test]
fn trace_records_reductions_and_dispatches() {
    let report = run_with(
        ir::seq(fx::put("k", 1), fx::get("k")),
        vec![],
        Env::new(),
        Store::new(),
        RunConfig::traced(),
    );
    let trace = report.trace.expect("trace was enabled");
    assert!(!trace.is_empty());
    assert!(trace.iter().any(|e| e.mode.starts_with("dispatch:")));
    assert!(trace.iter().any(|e| e.mode.starts_with("eval:")));
    // Step events serialize (they feed external tooling).
    let json = serde_json::to_string(&trace[0]).unwrap();
    assert!(json.contains("\"step\""));
}

#[test]
fn failed_runs_snapshot_the_kontinuation() {
    let prog = ir::bind(ir::pure(1), |_| ir::fail(VmError::user("dead end")));
    let report = run(prog);
    assert!(report.result.is_err());
    assert!(report.k_stack_on_error.is_some());
}
