//! One reduction per call: the pure transition function of the machine.

use crate::config::RunConfig;
use crate::dispatch::dispatch;
use crate::kont::Frame;
use crate::task::{Focus, Task};
use axon_core::{
    Action, CallArgs, Ctrl, Handler, ListenResult, ResumeToken, Value, VmError,
};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

/// What one reduction produced.
pub(crate) enum StepOutcome {
    /// The task can step again.
    Continue,
    /// A handler requested external actions; the dispatch token wakes
    /// the performer.
    Actions {
        actions: Vec<Action>,
        token: ResumeToken,
    },
    /// The kontinuation emptied on a value.
    Done(Value),
    /// The kontinuation emptied on an error.
    Failed(VmError),
}

/// Diagnostics for one reduction, fed to the trace.
#[derive(Default)]
pub(crate) struct StepInfo {
    pub mode: String,
    pub dispatch_depth: usize,
}

/// Advance a task by exactly one reduction.
pub(crate) fn step(
    task: &mut Task,
    root: &[Arc<dyn Handler>],
    config: &RunConfig,
    info: &mut StepInfo,
) -> StepOutcome {
    let focus = std::mem::replace(&mut task.focus, Focus::Suspended);
    match focus {
        Focus::Suspended => {
            // The machine never steps a suspended task; defensive only.
            StepOutcome::Continue
        }
        Focus::Eval(prog) => eval(task, prog, root, config, info),
        Focus::Deliver(value) => deliver(task, value, info),
        Focus::Raise(error) => raise(task, error, info),
    }
}

fn eval(
    task: &mut Task,
    prog: axon_core::Prog,
    root: &[Arc<dyn Handler>],
    config: &RunConfig,
    info: &mut StepInfo,
) -> StepOutcome {
    info.mode = format!("eval:{}", prog.tag());
    trace!(task = %task.id, node = prog.tag(), "eval");
    match &*prog {
        Ctrl::Pure(v) => {
            task.focus = Focus::Deliver(v.clone());
            StepOutcome::Continue
        }
        Ctrl::Perform(effect) => dispatch(task, effect.clone(), root, config, info),
        Ctrl::Map { inner, f } => {
            task.kont.push(Frame::Map(f.clone()));
            task.focus = Focus::Eval(inner.clone());
            StepOutcome::Continue
        }
        Ctrl::FlatMap { inner, f } => {
            task.kont.push(Frame::Bind(f.clone()));
            task.focus = Focus::Eval(inner.clone());
            StepOutcome::Continue
        }
        Ctrl::Call {
            kernel,
            args,
            kwargs,
            meta,
        } => {
            let mut pending: VecDeque<(Option<String>, axon_core::Prog)> = args
                .iter()
                .map(|p| (None, p.clone()))
                .chain(kwargs.iter().map(|(k, p)| (Some(k.clone()), p.clone())))
                .collect();
            match pending.pop_front() {
                None => match kernel(CallArgs::default()) {
                    Ok(body) => {
                        task.focus = Focus::Eval(body);
                        StepOutcome::Continue
                    }
                    Err(e) => {
                        task.focus = Focus::Raise(e);
                        StepOutcome::Continue
                    }
                },
                Some((slot, first)) => {
                    task.kont.push(Frame::Call {
                        kernel: kernel.clone(),
                        meta: meta.clone(),
                        pending,
                        current: slot,
                        args: Vec::new(),
                        kwargs: Vec::new(),
                    });
                    task.focus = Focus::Eval(first);
                    StepOutcome::Continue
                }
            }
        }
        Ctrl::WithHandler { handler, inner } => {
            task.kont.push(Frame::Handler(handler.clone()));
            task.focus = Focus::Eval(inner.clone());
            StepOutcome::Continue
        }
        Ctrl::Local { delta, inner } => {
            task.kont.push(Frame::Local {
                saved: task.env.clone(),
            });
            task.env = task.env.with(delta.iter().cloned());
            task.focus = Focus::Eval(inner.clone());
            StepOutcome::Continue
        }
        Ctrl::Listen { inner } => {
            task.kont.push(Frame::Listen {
                mark: task.store.log_len(),
            });
            task.focus = Focus::Eval(inner.clone());
            StepOutcome::Continue
        }
        Ctrl::Safe { inner } => {
            task.kont.push(Frame::Safe {
                saved: task.env.clone(),
            });
            task.focus = Focus::Eval(inner.clone());
            StepOutcome::Continue
        }
        Ctrl::Intercept { inner, transform } => {
            task.kont.push(Frame::Intercept(transform.clone()));
            task.focus = Focus::Eval(inner.clone());
            StepOutcome::Continue
        }
        _ => unreachable!("Ctrl has no other variants"),
    }
}

fn deliver(task: &mut Task, value: Value, info: &mut StepInfo) -> StepOutcome {
    info.mode = "deliver".to_string();
    let Some(frame) = task.kont.pop() else {
        return StepOutcome::Done(value);
    };
    match frame {
        Frame::Bind(f) => match f(value) {
            Ok(next) => task.focus = Focus::Eval(next),
            Err(e) => task.focus = Focus::Raise(e),
        },
        Frame::Map(f) => match f(value) {
            Ok(mapped) => task.focus = Focus::Deliver(mapped),
            Err(e) => task.focus = Focus::Raise(e),
        },
        // Scope markers: the value passes through unchanged.
        Frame::Handler(_) | Frame::Intercept(_) => task.focus = Focus::Deliver(value),
        Frame::Local { saved } => {
            task.env = saved;
            task.focus = Focus::Deliver(value);
        }
        Frame::Listen { mark } => {
            let log = task.store.log_since(mark);
            task.focus = Focus::Deliver(Value::Captured(Box::new(ListenResult {
                value,
                log,
            })));
        }
        Frame::Safe { saved } => {
            task.env = saved;
            task.focus = Focus::Deliver(Value::ok(value));
        }
        Frame::Call {
            kernel,
            meta,
            mut pending,
            current,
            mut args,
            mut kwargs,
        } => {
            match current {
                None => args.push(value),
                Some(name) => kwargs.push((name, value)),
            }
            match pending.pop_front() {
                Some((slot, next)) => {
                    task.kont.push(Frame::Call {
                        kernel,
                        meta,
                        pending,
                        current: slot,
                        args,
                        kwargs,
                    });
                    task.focus = Focus::Eval(next);
                }
                None => match kernel(CallArgs { args, kwargs }) {
                    Ok(body) => task.focus = Focus::Eval(body),
                    Err(e) => task.focus = Focus::Raise(e),
                },
            }
        }
        Frame::Gather { .. } | Frame::Race { .. } => {
            // Coordination frames are popped by the machine on child
            // settlement, never by an ordinary delivery.
            task.focus = Focus::Raise(VmError::HandlerProtocol(
                "value delivered to a coordination frame".to_string(),
            ));
        }
    }
    StepOutcome::Continue
}

fn raise(task: &mut Task, error: VmError, info: &mut StepInfo) -> StepOutcome {
    info.mode = "raise".to_string();
    let Some(frame) = task.kont.pop() else {
        return StepOutcome::Failed(error);
    };
    match frame {
        Frame::Safe { saved } => {
            task.env = saved;
            task.focus = Focus::Deliver(Value::err(error));
        }
        Frame::Local { saved } => {
            task.env = saved;
            task.focus = Focus::Raise(error);
        }
        // Listen discards its captures (the log itself keeps every
        // entry); everything else just unwinds.
        _ => task.focus = Focus::Raise(error),
    }
    StepOutcome::Continue
}
