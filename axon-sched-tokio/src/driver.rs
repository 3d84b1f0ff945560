//! The async driver loop.

use axon_core::{ResumeToken, TimeMs, Value, VmError};
use axon_vm::Machine;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::time::Duration;
use tracing::{debug, info};

type ExternalOutcome = (ResumeToken, Result<Value, VmError>);

/// Drive a machine until its root task settles, on the caller's tokio
/// runtime.
///
/// Ready tasks still step one at a time on the driver's own task — the
/// engine stays cooperative and single-threaded. What the event loop
/// buys is the outside world: external awaits overlap freely in a
/// [`FuturesUnordered`], and timed wakes are real `tokio::time::sleep`s
/// instead of clock jumps.
pub async fn drive(machine: &mut Machine) {
    info!("async driver start");
    let mut inflight: FuturesUnordered<BoxFuture<'static, ExternalOutcome>> =
        FuturesUnordered::new();
    loop {
        for work in machine.run_ready() {
            match work.future.take() {
                Some(fut) => {
                    let token = work.token;
                    inflight.push(Box::pin(async move {
                        let result = fut.await;
                        (token, result)
                    }));
                }
                None => machine.resume_external(
                    work.token,
                    Err(VmError::Resource(
                        "external future was already consumed".to_string(),
                    )),
                ),
            }
        }
        if machine.root_settled() {
            break;
        }
        if machine.advance() {
            continue;
        }
        match (inflight.is_empty(), machine.next_wake()) {
            (true, None) => {
                machine.fail_unsettled(VmError::Resource(format!(
                    "deadlock: {} tasks parked with no runnable work",
                    machine.parked_count()
                )));
                break;
            }
            (true, Some(wake)) => {
                tokio::time::sleep(until(machine, wake)).await;
            }
            (false, None) => {
                if let Some((token, result)) = inflight.next().await {
                    debug!(task = %token.task(), "external settled");
                    machine.resume_external(token, result);
                }
            }
            (false, Some(wake)) => {
                tokio::select! {
                    settled = inflight.next() => {
                        if let Some((token, result)) = settled {
                            debug!(task = %token.task(), "external settled");
                            machine.resume_external(token, result);
                        }
                    }
                    _ = tokio::time::sleep(until(machine, wake)) => {}
                }
            }
        }
    }
    machine.stamp_clock();
    info!(now_ms = machine.now().as_millis(), "async driver done");
}

fn until(machine: &Machine, wake: TimeMs) -> Duration {
    Duration::from_millis(wake.as_millis().saturating_sub(machine.now().as_millis()))
}
