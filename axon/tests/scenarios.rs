//! End-to-end scenarios over the deterministic driver.

use axon::prelude::*;
use axon_core::Semaphore;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Reader override restoration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn local_override_restores_around_the_scope() {
    let prog = ir::collect(vec![
        fx::ask("x"),
        ir::local([("x", "inner")], fx::ask("x")),
        fx::ask("x"),
    ]);
    let report = run_with(prog, vec![], RunOptions::new().env([("x", "outer")]));
    assert_eq!(
        report.result,
        Ok(Value::List(vec![
            Value::from("outer"),
            Value::from("inner"),
            Value::from("outer"),
        ]))
    );
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Safe provides failure isolation, not transactions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn safe_catches_without_rolling_back_state() {
    let prog = ir::collect(vec![
        ir::seq(
            fx::put("n", 0),
            ir::safe(ir::seq(fx::put("n", 1), ir::fail(VmError::user("boom")))),
        ),
        fx::get("n"),
    ]);
    let report = run(prog, vec![]);
    let Ok(Value::List(items)) = &report.result else {
        panic!("unexpected result: {:?}", report.result);
    };
    assert_eq!(items[0], Value::err(VmError::User("boom".to_string())));
    assert_eq!(items[1], Value::Int(1));
    assert_eq!(report.cell("n"), Some(&Value::Int(1)));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Listen captures only success
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn listen_wraps_a_successful_value_with_its_log() {
    let report = run(ir::listen(ir::seq(fx::tell("a"), ir::pure(42))), vec![]);
    assert_eq!(
        report.result,
        Ok(Value::Captured(Box::new(ListenResult {
            value: Value::Int(42),
            log: vec![Value::from("a")],
        })))
    );
}

#[test]
fn listen_under_error_produces_no_capture_but_writes_persist() {
    let prog = ir::safe(ir::listen(ir::seq(
        fx::tell("a"),
        ir::fail(VmError::user("x")),
    )));
    let report = run(prog, vec![]);
    assert_eq!(report.result, Ok(Value::err(VmError::User("x".to_string()))));
    assert_eq!(
        report.cell("__log__"),
        Some(&Value::List(vec![Value::from("a")]))
    );
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Gather ordering over a shared counter
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn take_number() -> Prog {
    ir::try_bind(fx::get("n"), |prior| {
        let n = prior
            .as_int()
            .ok_or_else(|| VmError::user("counter is not an int"))?;
        Ok(ir::seq(fx::put("n", n + 1), ir::pure(prior)))
    })
}

#[test]
fn gather_children_share_the_store_and_return_in_input_order() {
    let prog = ir::seq(
        fx::put("n", 0),
        ir::collect(vec![
            fx::gather(vec![take_number(), take_number(), take_number()]),
            fx::get("n"),
        ]),
    );
    let report = run(prog, vec![]);
    assert_eq!(
        report.result,
        Ok(Value::List(vec![
            Value::List(vec![Value::Int(0), Value::Int(1), Value::Int(2)]),
            Value::Int(3),
        ]))
    );
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Semaphore FIFO across spawn order
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn polite_worker(i: i64, sem: &Semaphore) -> Prog {
    let sem = sem.clone();
    ir::seq(
        fx::sem_acquire(sem.clone()),
        ir::seq(
            // Hold the permit across a suspension so later workers
            // genuinely block.
            fx::delay_secs(0.001),
            ir::seq(fx::tell(i), fx::sem_release(sem)),
        ),
    )
}

#[test]
fn semaphore_serves_blocked_acquirers_in_spawn_order() {
    let prog = ir::try_bind(fx::sem_create(1), |v| {
        let sem = v
            .as_sem()
            .cloned()
            .ok_or_else(|| VmError::user("expected a semaphore"))?;
        Ok(ir::seq(
            fx::gather(vec![
                polite_worker(1, &sem),
                polite_worker(2, &sem),
                polite_worker(3, &sem),
            ]),
            fx::get("__log__"),
        ))
    });
    let report = run(prog, vec![]);
    assert_eq!(
        report.result,
        Ok(Value::List(vec![
            Value::Int(1),
            Value::Int(2),
            Value::Int(3),
        ]))
    );
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Cancellation via race
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn race_cancels_the_slow_timer_completely() {
    let report = run(
        fx::race(vec![fx::delay_secs(10.0), ir::pure(7)]),
        vec![],
    );
    assert_eq!(report.result, Ok(Value::Int(7)));
    // The loser's wake never fired: simulated time did not move.
    assert_eq!(report.cell("__clock__"), Some(&Value::Int(0)));
}

#[test]
fn timeouts_are_races_where_the_work_loses() {
    let prog = ir::safe(fx::race(vec![
        ir::seq(fx::delay_secs(0.01), ir::fail(VmError::user("timed out"))),
        fx::delay_secs(60.0),
    ]));
    let report = run(prog, vec![]);
    assert_eq!(
        report.result,
        Ok(Value::err(VmError::User("timed out".to_string())))
    );
    // The run ended at the timeout, not after the slow branch.
    assert_eq!(report.cell("__clock__"), Some(&Value::Int(10)));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Intercept rewrites children of composite effects
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn intercept_reaches_into_gather_branches() {
    let child = || fx::ask("x");
    let prog = ir::intercept(fx::gather(vec![child(), child()]), |kind| match kind {
        EffectKind::Ask { .. } => Some(axon_core::Rewrite::Prog(ir::pure("intercepted"))),
        _ => None,
    });
    let report = run(prog, vec![]);
    assert_eq!(
        report.result,
        Ok(Value::List(vec![
            Value::from("intercepted"),
            Value::from("intercepted"),
        ]))
    );
}
