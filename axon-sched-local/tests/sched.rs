//! Scheduler disciplines and the synchronous driver.

use axon_core::{Env, Scheduler, Store, SubmitHint, TaskId, TimeMs, Value, VmError, fx, ir};
use axon_sched_local::{FifoScheduler, PriorityScheduler, ReadyOrder, SimScheduler, drive};
use axon_vm::{Machine, RunConfig};

fn t(n: u64) -> TaskId {
    TaskId::new(n)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Ready-queue disciplines
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn fifo_pops_in_submission_order() {
    let mut sched = FifoScheduler::new();
    for i in 0..3 {
        sched.submit(t(i), SubmitHint::Ready);
    }
    assert_eq!(sched.next(), Some(t(0)));
    assert_eq!(sched.next(), Some(t(1)));
    assert_eq!(sched.next(), Some(t(2)));
    assert_eq!(sched.next(), None);
}

#[test]
fn priority_orders_by_hint_then_submission() {
    let mut sched = PriorityScheduler::new();
    sched.submit(t(0), SubmitHint::Priority(5));
    sched.submit(t(1), SubmitHint::Priority(1));
    sched.submit(t(2), SubmitHint::Priority(5));
    sched.submit(t(3), SubmitHint::Ready); // priority 0
    assert_eq!(sched.next(), Some(t(3)));
    assert_eq!(sched.next(), Some(t(1)));
    assert_eq!(sched.next(), Some(t(0)));
    assert_eq!(sched.next(), Some(t(2)));
}

#[test]
fn sim_fifo_vs_lifo() {
    let mut fifo = SimScheduler::with_order(ReadyOrder::Fifo);
    let mut lifo = SimScheduler::with_order(ReadyOrder::Lifo);
    for i in 0..3 {
        fifo.submit(t(i), SubmitHint::Ready);
        lifo.submit(t(i), SubmitHint::Ready);
    }
    assert_eq!(fifo.next(), Some(t(0)));
    assert_eq!(lifo.next(), Some(t(2)));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// The virtual clock
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn clock_jumps_to_the_earliest_wake() {
    let mut sched = SimScheduler::new();
    sched.schedule_at(t(1), TimeMs::from_millis(500));
    sched.schedule_at(t(2), TimeMs::from_millis(200));
    assert_eq!(sched.now(), TimeMs::ZERO);
    assert_eq!(sched.next_wake(), Some(TimeMs::from_millis(200)));
    assert_eq!(sched.advance(), vec![t(2)]);
    assert_eq!(sched.now(), TimeMs::from_millis(200));
    assert_eq!(sched.advance(), vec![t(1)]);
    assert_eq!(sched.now(), TimeMs::from_millis(500));
    assert!(sched.advance().is_empty());
}

#[test]
fn simultaneous_wakes_pop_in_schedule_order() {
    let mut sched = SimScheduler::new();
    sched.schedule_at(t(1), TimeMs::from_millis(100));
    sched.schedule_at(t(2), TimeMs::from_millis(100));
    assert_eq!(sched.advance(), vec![t(1), t(2)]);
}

#[test]
fn forget_purges_both_queues() {
    let mut sched = SimScheduler::new();
    sched.submit(t(1), SubmitHint::Ready);
    sched.schedule_at(t(2), TimeMs::from_millis(100));
    sched.forget(t(1));
    sched.forget(t(2));
    assert_eq!(sched.next(), None);
    assert_eq!(sched.next_wake(), None);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// The synchronous driver
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn run(prog: axon_core::Prog) -> axon_core::RunReport {
    let mut machine = Machine::new(
        Env::new(),
        Store::new(),
        axon_handlers::default_stack(),
        Box::new(SimScheduler::new()),
        RunConfig::default(),
    );
    machine.start(prog);
    drive(&mut machine);
    machine.report()
}

#[test]
fn delay_advances_virtual_time_without_sleeping() {
    let started = std::time::Instant::now();
    let report = run(ir::seq(fx::delay_secs(60.0), fx::get_time()));
    assert_eq!(report.result, Ok(Value::Int(60_000)));
    assert_eq!(report.cell("__clock__"), Some(&Value::Int(60_000)));
    // A whole simulated minute passes in well under a real second.
    assert!(started.elapsed() < std::time::Duration::from_secs(1));
}

#[test]
fn wait_until_parks_to_an_absolute_deadline() {
    let report = run(ir::seq(
        fx::wait_until(TimeMs::from_millis(250)),
        fx::get_time(),
    ));
    assert_eq!(report.result, Ok(Value::Int(250)));
}

#[test]
fn external_awaits_resolve_by_blocking() {
    let report = run(fx::await_external(async { Ok(Value::from("from outside")) }));
    assert_eq!(report.result, Ok(Value::from("from outside")));
}

#[test]
fn a_starved_acquire_deadlocks_the_run() {
    let prog = ir::try_bind(fx::sem_create(0), |v| {
        let sem = v
            .as_sem()
            .cloned()
            .ok_or_else(|| VmError::user("expected a semaphore"))?;
        Ok(fx::sem_acquire(sem))
    });
    let report = run(prog);
    match report.result {
        Err(VmError::Resource(msg)) => assert!(msg.contains("deadlock"), "msg was {msg}"),
        other => panic!("expected a deadlock, got {other:?}"),
    }
}

#[test]
fn identical_runs_take_identical_traces() {
    let prog = || {
        ir::seq(
            fx::put("n", 0),
            ir::seq(
                fx::gather(vec![fx::modify("n", |v| Ok(Value::Int(v.as_int().unwrap_or(0) + 1))); 3]),
                fx::get("n"),
            ),
        )
    };
    let trace_of = |p| {
        let mut machine = Machine::new(
            Env::new(),
            Store::new(),
            axon_handlers::default_stack(),
            Box::new(SimScheduler::new()),
            RunConfig::traced(),
        );
        machine.start(p);
        drive(&mut machine);
        let report = machine.report();
        (
            report.result.clone(),
            report
                .trace
                .unwrap()
                .iter()
                .map(|e| format!("{}:{}", e.task, e.mode))
                .collect::<Vec<_>>(),
        )
    };
    let (r1, t1) = trace_of(prog());
    let (r2, t2) = trace_of(prog());
    assert_eq!(r1, r2);
    assert_eq!(t1, t2);
}
