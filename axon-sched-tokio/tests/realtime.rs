//! The wall-clock driver on a real tokio runtime.

use axon_core::{Env, Store, Value, VmError, fx, ir};
use axon_sched_tokio::{TokioScheduler, drive};
use axon_vm::{Machine, RunConfig};
use std::time::{Duration, Instant};

async fn run(prog: axon_core::Prog) -> axon_core::RunReport {
    let mut machine = Machine::new(
        Env::new(),
        Store::new(),
        axon_handlers::default_stack(),
        Box::new(TokioScheduler::new()),
        RunConfig::default(),
    );
    machine.start(prog);
    drive(&mut machine).await;
    machine.report()
}

#[tokio::test]
async fn delay_really_sleeps() {
    let started = Instant::now();
    let report = run(fx::delay_secs(0.05)).await;
    assert!(report.result.is_ok());
    assert!(started.elapsed() >= Duration::from_millis(45));
}

#[tokio::test]
async fn external_awaits_run_on_the_event_loop() {
    let report = run(fx::await_external(async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(Value::Int(99))
    }))
    .await;
    assert_eq!(report.result, Ok(Value::Int(99)));
}

#[tokio::test]
async fn external_awaits_overlap() {
    let slow = || {
        fx::await_external(async {
            tokio::time::sleep(Duration::from_millis(40)).await;
            Ok(Value::Int(1))
        })
    };
    let started = Instant::now();
    let report = run(fx::gather(vec![slow(), slow(), slow()])).await;
    assert_eq!(
        report.result,
        Ok(Value::List(vec![Value::Int(1), Value::Int(1), Value::Int(1)]))
    );
    // Three 40ms awaits overlapped; well under the 120ms serial cost.
    assert!(started.elapsed() < Duration::from_millis(110));
}

#[tokio::test]
async fn race_against_a_real_timeout() {
    let work = fx::await_external(async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(Value::from("fast"))
    });
    let report = run(fx::race(vec![fx::delay_secs(5.0), work])).await;
    assert_eq!(report.result, Ok(Value::from("fast")));
}

#[tokio::test]
async fn external_errors_propagate_as_user_errors() {
    let report = run(fx::await_external(async {
        Err(VmError::user("remote said no"))
    }))
    .await;
    assert_eq!(report.result, Err(VmError::User("remote said no".to_string())));
}

#[tokio::test]
async fn state_and_reader_semantics_match_the_sim_driver() {
    let prog = ir::collect(vec![
        ir::seq(fx::put("n", 1), fx::get("n")),
        ir::local([("x", "inner")], fx::ask("x")),
    ]);
    let mut machine = Machine::new(
        Env::new().with([("x", "outer")]),
        Store::new(),
        axon_handlers::default_stack(),
        Box::new(TokioScheduler::new()),
        RunConfig::default(),
    );
    machine.start(prog);
    drive(&mut machine).await;
    let report = machine.report();
    assert_eq!(
        report.result,
        Ok(Value::List(vec![Value::Int(1), Value::from("inner")]))
    );
}
