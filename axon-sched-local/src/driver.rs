//! The synchronous driver loop.

use axon_core::VmError;
use axon_vm::Machine;
use tracing::{debug, info};

/// Drive a machine until its root task settles.
///
/// The loop alternates three phases: run every ready task, resolve any
/// external work by blocking on it, and advance the clock to the next
/// timed wake. When none of the three can make progress and the root is
/// still pending, the run is deadlocked and the root future is rejected
/// with a resource error.
///
/// Orphan tasks — spawned but never waited on — keep running as long as
/// they are ready, but once the root settles the driver stops: parked
/// orphans and their timed wakes are abandoned.
///
/// External awaits are resolved by blocking the driver thread on the
/// future, one at a time, in the order the performs reached the
/// machine. Programs that need real overlap of external work belong on
/// the async driver.
pub fn drive(machine: &mut Machine) {
    info!("sync driver start");
    loop {
        let external = machine.run_ready();
        if machine.root_settled() {
            break;
        }
        if !external.is_empty() {
            debug!(count = external.len(), "resolving external work");
            for work in external {
                match work.future.take() {
                    Some(fut) => {
                        let result = futures::executor::block_on(fut);
                        machine.resume_external(work.token, result);
                    }
                    None => machine.resume_external(
                        work.token,
                        Err(VmError::Resource(
                            "external future was already consumed".to_string(),
                        )),
                    ),
                }
            }
            continue;
        }
        if machine.advance() {
            continue;
        }
        machine.fail_unsettled(VmError::Resource(format!(
            "deadlock: {} tasks parked with no runnable work",
            machine.parked_count()
        )));
        break;
    }
    machine.stamp_clock();
    info!(now_ms = machine.now().as_millis(), "sync driver done");
}
