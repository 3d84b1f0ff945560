//! The machine: owns tasks, futures, and the scheduler, and executes
//! external actions.

use crate::config::RunConfig;
use crate::kont::Frame;
use crate::step::{StepInfo, StepOutcome, step};
use crate::task::{Focus, Task, TaskStatus};
use axon_core::{
    Action, Branch, CLOCK_KEY, Env, ExternalFuture, FutureId, Handler, ParkReason, Prog,
    ResumeToken, RunReport, Scheduler, SemaphoreId, Semaphore, Store, StorePolicy, StepEvent,
    SubmitHint, TaskId, TimeMs, Value, VmError,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Work only the driver can do: resolve a future against the outside
/// world, then hand the result back via
/// [`Machine::resume_external`].
pub struct ExternalWork {
    /// The parked performer's single-shot continuation.
    pub token: ResumeToken,
    /// The future to resolve.
    pub future: ExternalFuture,
}

enum FutureState {
    Pending(Vec<Waiter>),
    Resolved(Value),
    Rejected(VmError),
    Cancelled,
}

enum Waiter {
    /// An ordinary `Wait`: resume this continuation with the outcome.
    Token(ResumeToken),
    /// Fill slot `index` of the parent's gather frame.
    Gather { parent: TaskId, index: usize },
    /// Settle the parent's race frame.
    Race { parent: TaskId },
}

/// The CESK machine over a task table.
///
/// The machine executes every [`Action`] a handler requests except
/// awaiting the outside world; those queue up as [`ExternalWork`] and
/// the driver resolves them. The machine never sleeps or blocks — a
/// driver loop alternates [`run_ready`](Machine::run_ready),
/// [`advance`](Machine::advance), and external resolution until the
/// root settles.
pub struct Machine {
    tasks: BTreeMap<TaskId, Task>,
    futures: BTreeMap<FutureId, FutureState>,
    scheduler: Box<dyn Scheduler>,
    root_handlers: Vec<Arc<dyn Handler>>,
    config: RunConfig,
    base_env: Env,
    base_store: Store,
    root: Option<TaskId>,
    next_task: u64,
    next_future: u64,
    next_sem: u64,
    steps: u64,
    halted: bool,
    halt_error: Option<VmError>,
    trace: Vec<StepEvent>,
    error_k_stack: Option<Vec<String>>,
    error_effects: Option<Vec<String>>,
    external: Vec<ExternalWork>,
    timer_tokens: BTreeMap<TaskId, ResumeToken>,
}

impl Machine {
    /// Build a machine over initial bindings, a store, a root handler
    /// chain (element 0 outermost), and a scheduler.
    pub fn new(
        env: Env,
        store: Store,
        root_handlers: Vec<Arc<dyn Handler>>,
        scheduler: Box<dyn Scheduler>,
        config: RunConfig,
    ) -> Self {
        Self {
            tasks: BTreeMap::new(),
            futures: BTreeMap::new(),
            scheduler,
            root_handlers,
            config,
            base_env: env,
            base_store: store,
            root: None,
            next_task: 0,
            next_future: 0,
            next_sem: 0,
            steps: 0,
            halted: false,
            halt_error: None,
            trace: Vec::new(),
            error_k_stack: None,
            error_effects: None,
            external: Vec::new(),
            timer_tokens: BTreeMap::new(),
        }
    }

    /// Spawn the root task. Call once per run.
    pub fn start(&mut self, prog: Prog) -> TaskId {
        let tid = self.spawn(prog, self.base_env.clone(), self.base_store.clone());
        self.root = Some(tid);
        tid
    }

    /// The run clock.
    pub fn now(&self) -> TimeMs {
        self.scheduler.now()
    }

    /// The earliest pending timed wake, if any.
    pub fn next_wake(&self) -> Option<TimeMs> {
        self.scheduler.next_wake()
    }

    /// The root store handle.
    pub fn store(&self) -> &Store {
        &self.base_store
    }

    /// True once the root task's future has settled.
    pub fn root_settled(&self) -> bool {
        match self.root.and_then(|tid| self.tasks.get(&tid)) {
            Some(task) => !matches!(
                self.futures.get(&task.future),
                Some(FutureState::Pending(_))
            ),
            None => false,
        }
    }

    /// Number of tasks parked on resources, for deadlock diagnostics.
    pub fn parked_count(&self) -> usize {
        self.tasks
            .values()
            .filter(|t| matches!(t.status, TaskStatus::Parked(_)))
            .count()
    }

    /// Run every ready task until the ready queue drains, then hand
    /// back any external work that accumulated.
    pub fn run_ready(&mut self) -> Vec<ExternalWork> {
        while !self.halted {
            let Some(tid) = self.scheduler.next() else {
                break;
            };
            self.run_task(tid);
        }
        if self.halted
            && let Some(error) = self.halt_error.take()
        {
            self.fail_unsettled(error);
        }
        std::mem::take(&mut self.external)
    }

    /// Advance the clock to the next wake point and resume the tasks
    /// that came due. Returns false if no timed work was pending.
    pub fn advance(&mut self) -> bool {
        let due = self.scheduler.advance();
        if due.is_empty() {
            return false;
        }
        for tid in due {
            if let Some(token) = self.timer_tokens.remove(&tid) {
                self.wake_parked(token, Ok(Value::Unit));
            }
        }
        true
    }

    /// Resolve one piece of external work with the outcome the driver
    /// observed.
    pub fn resume_external(&mut self, token: ResumeToken, result: Result<Value, VmError>) {
        self.wake_parked(token, result);
    }

    /// Reject the root future if the run ended without settling it
    /// (driver deadlock, step budget).
    pub fn fail_unsettled(&mut self, error: VmError) {
        let Some(root) = self.root else { return };
        let Some(task) = self.tasks.get_mut(&root) else {
            return;
        };
        if matches!(self.futures.get(&task.future), Some(FutureState::Pending(_))) {
            task.status = TaskStatus::Failed;
            let fid = task.future;
            self.settle_future(fid, Err(error));
        }
    }

    /// Record the final clock reading in the store.
    pub fn stamp_clock(&self) {
        self.base_store
            .put(CLOCK_KEY, Value::Int(self.scheduler.now().as_millis() as i64));
    }

    /// Assemble the run report for the root task.
    pub fn report(&mut self) -> RunReport {
        let result = match self.root.and_then(|tid| self.tasks.get(&tid)) {
            None => Err(VmError::Resource("run was never started".to_string())),
            Some(task) => match self.futures.get(&task.future) {
                Some(FutureState::Resolved(v)) => Ok(v.clone()),
                Some(FutureState::Rejected(e)) => Err(e.clone()),
                Some(FutureState::Cancelled) => Err(VmError::Cancelled),
                Some(FutureState::Pending(_)) | None => Err(VmError::Resource(
                    "run ended before the root task settled".to_string(),
                )),
            },
        };
        let failed = result.is_err();
        RunReport {
            result,
            store: self.base_store.export(),
            trace: self.config.trace.then(|| std::mem::take(&mut self.trace)),
            k_stack_on_error: if failed { self.error_k_stack.take() } else { None },
            effect_stack_on_error: if failed { self.error_effects.take() } else { None },
        }
    }

    // ── internals ─────────────────────────────────────────────────

    fn spawn(&mut self, prog: Prog, env: Env, store: Store) -> TaskId {
        let tid = TaskId::new(self.next_task);
        self.next_task += 1;
        let fid = FutureId::new(self.next_future);
        self.next_future += 1;
        self.futures.insert(fid, FutureState::Pending(Vec::new()));
        self.tasks.insert(tid, Task::new(tid, prog, env, store, fid));
        self.scheduler.submit(tid, SubmitHint::Ready);
        debug!(task = %tid, "spawned");
        tid
    }

    /// Run one task until it parks, suspends, terminates, or the run
    /// halts. Cooperative: nothing preempts it in between.
    fn run_task(&mut self, tid: TaskId) {
        let Some(mut task) = self.tasks.remove(&tid) else {
            return;
        };
        loop {
            if self.halted
                || !matches!(task.status, TaskStatus::Running)
                || matches!(task.focus, Focus::Suspended)
            {
                break;
            }
            if let Some(max) = self.config.max_steps
                && self.steps >= max
            {
                self.halted = true;
                self.halt_error = Some(VmError::Resource(format!(
                    "exceeded max_steps={max}"
                )));
                break;
            }
            self.steps += 1;
            let was_raising = matches!(task.focus, Focus::Raise(_));
            let mut info = StepInfo::default();
            let outcome = step(&mut task, &self.root_handlers, &self.config, &mut info);
            if !was_raising
                && matches!(task.focus, Focus::Raise(_))
                && Some(tid) == self.root
            {
                self.snapshot_error(&task);
            }
            if self.config.trace {
                self.trace.push(StepEvent {
                    step: self.steps,
                    task: tid,
                    mode: std::mem::take(&mut info.mode),
                    pending: self.scheduler.pending(),
                    dispatch_depth: info.dispatch_depth,
                    frame_summary: task.frame_summary(),
                });
            }
            match outcome {
                StepOutcome::Continue => continue,
                StepOutcome::Actions { actions, token } => {
                    if !self.execute_actions(&mut task, actions, token) {
                        break;
                    }
                }
                StepOutcome::Done(value) => {
                    trace!(task = %tid, "completed");
                    task.status = TaskStatus::Completed;
                    let fid = task.future;
                    self.tasks.insert(tid, task);
                    self.settle_future(fid, Ok(value));
                    return;
                }
                StepOutcome::Failed(error) => {
                    debug!(task = %tid, %error, "failed");
                    task.status = TaskStatus::Failed;
                    let fid = task.future;
                    self.tasks.insert(tid, task);
                    self.settle_future(fid, Err(error));
                    return;
                }
            }
        }
        self.tasks.insert(tid, task);
    }

    /// Execute a handler's actions against the held-out performer.
    /// Returns true if the performer can keep stepping.
    fn execute_actions(
        &mut self,
        performer: &mut Task,
        actions: Vec<Action>,
        dispatch_token: ResumeToken,
    ) -> bool {
        let mut resumed = false;
        let mut parked = false;
        for action in actions {
            match action {
                Action::Spawn { prog, store, reply } => {
                    let child_store = match store {
                        StorePolicy::Shared => performer.store.clone(),
                        StorePolicy::Snapshot => performer.store.snapshot(),
                    };
                    let child = self.spawn(prog, performer.env.clone(), child_store);
                    self.wake_token(performer, reply, Ok(Value::Task(child)), &mut resumed);
                }
                Action::Park { reason } => {
                    performer.status = TaskStatus::Parked(reason);
                    parked = true;
                }
                Action::Wake { token, result } => {
                    self.wake_token(performer, token, result, &mut resumed);
                }
                Action::WaitTask { task } => {
                    self.wait_task(performer, task, &dispatch_token, &mut resumed, &mut parked);
                }
                Action::Gather { branches } => {
                    self.install_join(
                        performer,
                        branches,
                        JoinKind::Gather,
                        &dispatch_token,
                        &mut resumed,
                        &mut parked,
                    );
                }
                Action::Race { branches } => {
                    self.install_join(
                        performer,
                        branches,
                        JoinKind::Race,
                        &dispatch_token,
                        &mut resumed,
                        &mut parked,
                    );
                }
                Action::ScheduleAt { wake_at } => {
                    performer.status = TaskStatus::Parked(ParkReason::Timer(wake_at));
                    self.scheduler.schedule_at(performer.id, wake_at);
                    self.timer_tokens
                        .insert(performer.id, dispatch_token.clone());
                    parked = true;
                }
                Action::ScheduleAfter { delay } => {
                    let wake_at = self.scheduler.now() + delay;
                    performer.status = TaskStatus::Parked(ParkReason::Timer(wake_at));
                    self.scheduler.schedule_at(performer.id, wake_at);
                    self.timer_tokens
                        .insert(performer.id, dispatch_token.clone());
                    parked = true;
                }
                Action::AwaitExternal { future } => {
                    performer.status = TaskStatus::Parked(ParkReason::External);
                    self.external.push(ExternalWork {
                        token: dispatch_token.clone(),
                        future,
                    });
                    parked = true;
                }
                Action::CancelTask { task } => {
                    if task == performer.id {
                        performer.status = TaskStatus::Cancelled;
                        performer.focus = Focus::Suspended;
                        let fid = performer.future;
                        self.settle_cancelled(fid);
                        parked = true;
                    } else {
                        self.cancel_task(task);
                    }
                }
                Action::CreateSemaphore { permits, reply } => {
                    let id = SemaphoreId::new(self.next_sem);
                    self.next_sem += 1;
                    let sem = Semaphore::new(id, permits);
                    self.wake_token(performer, reply, Ok(Value::Sem(sem)), &mut resumed);
                }
                Action::GetTime { reply } => {
                    let now = self.scheduler.now().as_millis() as i64;
                    self.wake_token(performer, reply, Ok(Value::Int(now)), &mut resumed);
                }
                _ => unreachable!("Action has no other variants"),
            }
        }
        if !resumed && !parked {
            // A well-formed handler either parks the performer or wakes
            // something; silence would strand the task forever.
            performer.focus = Focus::Raise(VmError::HandlerProtocol(
                "dispatch suspended the task with no pending wake".to_string(),
            ));
            resumed = true;
        }
        resumed && matches!(performer.status, TaskStatus::Running)
    }

    /// Wake through a token: the performer directly, anyone else via
    /// the task table. A consumed token raises in the performer.
    fn wake_token(
        &mut self,
        performer: &mut Task,
        token: ResumeToken,
        result: Result<Value, VmError>,
        resumed: &mut bool,
    ) {
        if let Err(e) = token.consume() {
            performer.focus = Focus::Raise(e);
            *resumed = true;
            return;
        }
        if token.task() == performer.id {
            performer.focus = match result {
                Ok(v) => Focus::Deliver(v),
                Err(e) => Focus::Raise(e),
            };
            *resumed = true;
        } else {
            self.wake_resident(token.task(), result);
        }
    }

    /// Consume a token and wake its (map-resident, parked) task.
    fn wake_parked(&mut self, token: ResumeToken, result: Result<Value, VmError>) {
        if token.consume().is_err() {
            warn!(task = %token.task(), "continuation resumed twice; ignoring");
            return;
        }
        self.wake_resident(token.task(), result);
    }

    fn wake_resident(&mut self, tid: TaskId, result: Result<Value, VmError>) {
        let Some(task) = self.tasks.get_mut(&tid) else {
            return;
        };
        match task.status {
            TaskStatus::Parked(_) => {
                task.status = TaskStatus::Running;
                task.focus = match result {
                    Ok(v) => Focus::Deliver(v),
                    Err(e) => Focus::Raise(e),
                };
                self.scheduler.submit(tid, SubmitHint::Ready);
            }
            _ => {
                warn!(task = %tid, status = ?task.status, "wake ignored");
            }
        }
    }

    fn wait_task(
        &mut self,
        performer: &mut Task,
        target: TaskId,
        dispatch_token: &ResumeToken,
        resumed: &mut bool,
        parked: &mut bool,
    ) {
        if target == performer.id {
            performer.focus = Focus::Raise(VmError::Resource(
                "a task cannot wait on itself".to_string(),
            ));
            *resumed = true;
            return;
        }
        let Some(fid) = self.tasks.get(&target).map(|t| t.future) else {
            performer.focus = Focus::Raise(VmError::Resource(format!(
                "waited on unknown task {target}"
            )));
            *resumed = true;
            return;
        };
        match self.futures.get_mut(&fid) {
            Some(FutureState::Pending(waiters)) => {
                waiters.push(Waiter::Token(dispatch_token.clone()));
                performer.status = TaskStatus::Parked(ParkReason::Task(target));
                *parked = true;
            }
            Some(FutureState::Resolved(v)) => {
                let v = v.clone();
                self.wake_token(performer, dispatch_token.clone(), Ok(v), resumed);
            }
            Some(FutureState::Rejected(e)) => {
                let e = e.clone();
                self.wake_token(performer, dispatch_token.clone(), Err(e), resumed);
            }
            Some(FutureState::Cancelled) => {
                self.wake_token(
                    performer,
                    dispatch_token.clone(),
                    Err(VmError::Cancelled),
                    resumed,
                );
            }
            None => {
                performer.focus = Focus::Raise(VmError::Resource(format!(
                    "future of task {target} was dropped"
                )));
                *resumed = true;
            }
        }
    }

    fn install_join(
        &mut self,
        performer: &mut Task,
        branches: Vec<Branch>,
        kind: JoinKind,
        dispatch_token: &ResumeToken,
        resumed: &mut bool,
        parked: &mut bool,
    ) {
        if branches.is_empty() {
            match kind {
                JoinKind::Gather => self.wake_token(
                    performer,
                    dispatch_token.clone(),
                    Ok(Value::List(Vec::new())),
                    resumed,
                ),
                JoinKind::Race => {
                    performer.focus = Focus::Raise(VmError::Resource(
                        "race over no branches".to_string(),
                    ));
                    *resumed = true;
                }
            }
            return;
        }

        // Spawn program branches in input order; the deterministic
        // scheduler then runs them in that order.
        let mut children = Vec::with_capacity(branches.len());
        for branch in branches {
            match branch {
                Branch::Prog(prog) => {
                    // Gather/race branches always share the performer's
                    // store view.
                    let child =
                        self.spawn(prog, performer.env.clone(), performer.store.clone());
                    children.push(child);
                }
                Branch::Task(tid) => children.push(tid),
            }
        }

        match kind {
            JoinKind::Gather => {
                performer.kont.push(Frame::Gather {
                    results: vec![None; children.len()],
                    outstanding: children.len(),
                    children: children.clone(),
                });
                performer.status = TaskStatus::Parked(ParkReason::Gather);
            }
            JoinKind::Race => {
                performer.kont.push(Frame::Race {
                    children: children.clone(),
                });
                performer.status = TaskStatus::Parked(ParkReason::Race);
            }
        }
        *parked = true;

        // Register waiters, settling immediately against branches that
        // already finished (joined tasks may be long done).
        for (index, child) in children.iter().enumerate() {
            if !matches!(performer.status, TaskStatus::Parked(_)) {
                // An earlier settlement already closed the join.
                break;
            }
            let Some(fid) = self.tasks.get(child).map(|t| t.future) else {
                self.close_join(performer, Err(VmError::Resource(format!(
                    "joined unknown task {child}"
                ))));
                *resumed = true;
                *parked = false;
                break;
            };
            let settled = match self.futures.get_mut(&fid) {
                Some(FutureState::Pending(waiters)) => {
                    waiters.push(match kind {
                        JoinKind::Gather => Waiter::Gather {
                            parent: performer.id,
                            index,
                        },
                        JoinKind::Race => Waiter::Race {
                            parent: performer.id,
                        },
                    });
                    None
                }
                Some(FutureState::Resolved(v)) => Some(Ok(v.clone())),
                Some(FutureState::Rejected(e)) => Some(Err(e.clone())),
                Some(FutureState::Cancelled) | None => Some(Err(VmError::Cancelled)),
            };
            if let Some(outcome) = settled {
                let woken = match kind {
                    JoinKind::Gather => self.apply_gather(performer, index, outcome),
                    JoinKind::Race => self.apply_race(performer, outcome),
                };
                if woken {
                    performer.status = TaskStatus::Running;
                    *resumed = true;
                    *parked = false;
                }
            }
        }
    }

    /// Apply a branch settlement to a parent's gather frame. Returns
    /// true if the join closed and the parent has a new focus.
    fn apply_gather(
        &mut self,
        parent: &mut Task,
        index: usize,
        outcome: Result<Value, VmError>,
    ) -> bool {
        let Some(Frame::Gather { .. }) = parent.kont.last() else {
            return false; // stale notice: the join already closed
        };
        match outcome {
            Ok(value) => {
                let Some(Frame::Gather {
                    results,
                    outstanding,
                    ..
                }) = parent.kont.last_mut()
                else {
                    return false;
                };
                if results[index].is_none() {
                    results[index] = Some(value);
                    *outstanding -= 1;
                }
                if *outstanding == 0 {
                    let Some(Frame::Gather { results, .. }) = parent.kont.pop() else {
                        return false;
                    };
                    let values = results.into_iter().flatten().collect();
                    parent.focus = Focus::Deliver(Value::List(values));
                    true
                } else {
                    false
                }
            }
            Err(error) => {
                // First error wins: abort the remaining branches. Store
                // effects the children already performed persist.
                let Some(Frame::Gather { children, .. }) = parent.kont.pop() else {
                    return false;
                };
                for child in children {
                    self.cancel_task(child);
                }
                parent.focus = Focus::Raise(error);
                true
            }
        }
    }

    /// Apply the first branch settlement to a parent's race frame.
    fn apply_race(&mut self, parent: &mut Task, outcome: Result<Value, VmError>) -> bool {
        let Some(Frame::Race { .. }) = parent.kont.last() else {
            return false;
        };
        let Some(Frame::Race { children }) = parent.kont.pop() else {
            return false;
        };
        for child in children {
            self.cancel_task(child);
        }
        parent.focus = match outcome {
            Ok(v) => Focus::Deliver(v),
            Err(e) => Focus::Raise(e),
        };
        true
    }

    /// Close a join with an error before it was fully installed.
    fn close_join(&mut self, parent: &mut Task, outcome: Result<Value, VmError>) {
        match parent.kont.last() {
            Some(Frame::Gather { .. }) => {
                if let Some(Frame::Gather { children, .. }) = parent.kont.pop() {
                    for child in children {
                        self.cancel_task(child);
                    }
                }
            }
            Some(Frame::Race { .. }) => {
                if let Some(Frame::Race { children }) = parent.kont.pop() {
                    for child in children {
                        self.cancel_task(child);
                    }
                }
            }
            _ => {}
        }
        parent.status = TaskStatus::Running;
        parent.focus = match outcome {
            Ok(v) => Focus::Deliver(v),
            Err(e) => Focus::Raise(e),
        };
    }

    /// Cancel a map-resident task: purge it from every waiter structure
    /// it occupies and deliver `Cancelled` through its future.
    fn cancel_task(&mut self, tid: TaskId) {
        let (fid, reason) = {
            let Some(task) = self.tasks.get_mut(&tid) else {
                return;
            };
            if task.status.is_terminal() {
                return;
            }
            let reason = match &task.status {
                TaskStatus::Parked(r) => Some(r.clone()),
                _ => None,
            };
            task.status = TaskStatus::Cancelled;
            task.focus = Focus::Suspended;
            (task.future, reason)
        };
        debug!(task = %tid, "cancelled");
        match reason {
            Some(ParkReason::Semaphore(sem)) => {
                // The waiter never held a permit, so none is consumed.
                sem.purge_waiter(tid);
            }
            Some(ParkReason::Task(waited)) => {
                if let Some(wf) = self.tasks.get(&waited).map(|t| t.future)
                    && let Some(FutureState::Pending(waiters)) = self.futures.get_mut(&wf)
                {
                    waiters.retain(
                        |w| !matches!(w, Waiter::Token(t) if t.task() == tid),
                    );
                }
            }
            Some(ParkReason::Timer(_)) => {
                self.timer_tokens.remove(&tid);
            }
            _ => {}
        }
        self.scheduler.forget(tid);
        self.settle_cancelled(fid);
    }

    fn settle_future(&mut self, fid: FutureId, outcome: Result<Value, VmError>) {
        let waiters = match self.futures.get_mut(&fid) {
            Some(state @ FutureState::Pending(_)) => {
                let FutureState::Pending(waiters) =
                    std::mem::replace(state, match &outcome {
                        Ok(v) => FutureState::Resolved(v.clone()),
                        Err(e) => FutureState::Rejected(e.clone()),
                    })
                else {
                    unreachable!()
                };
                waiters
            }
            _ => return,
        };
        for waiter in waiters {
            self.notify_waiter(waiter, outcome.clone());
        }
    }

    fn settle_cancelled(&mut self, fid: FutureId) {
        let waiters = match self.futures.get_mut(&fid) {
            Some(state @ FutureState::Pending(_)) => {
                let FutureState::Pending(waiters) =
                    std::mem::replace(state, FutureState::Cancelled)
                else {
                    unreachable!()
                };
                waiters
            }
            _ => return,
        };
        for waiter in waiters {
            self.notify_waiter(waiter, Err(VmError::Cancelled));
        }
    }

    fn notify_waiter(&mut self, waiter: Waiter, outcome: Result<Value, VmError>) {
        match waiter {
            Waiter::Token(token) => self.wake_parked(token, outcome),
            Waiter::Gather { parent, index } => {
                let Some(mut task) = self.tasks.remove(&parent) else {
                    return;
                };
                if task.status.is_terminal() {
                    self.tasks.insert(parent, task);
                    return;
                }
                let woken = self.apply_gather(&mut task, index, outcome);
                if woken {
                    task.status = TaskStatus::Running;
                    self.scheduler.submit(parent, SubmitHint::Ready);
                }
                self.tasks.insert(parent, task);
            }
            Waiter::Race { parent } => {
                let Some(mut task) = self.tasks.remove(&parent) else {
                    return;
                };
                if task.status.is_terminal() {
                    self.tasks.insert(parent, task);
                    return;
                }
                let woken = self.apply_race(&mut task, outcome);
                if woken {
                    task.status = TaskStatus::Running;
                    self.scheduler.submit(parent, SubmitHint::Ready);
                }
                self.tasks.insert(parent, task);
            }
        }
    }

    fn snapshot_error(&mut self, task: &Task) {
        self.error_k_stack = Some(task.frame_summaries());
        let mut effects: Vec<String> = task
            .kont
            .iter()
            .rev()
            .filter_map(|frame| match frame {
                Frame::Call { meta, .. } => Some(format!("call:{}", meta.name)),
                _ => None,
            })
            .collect();
        if let Some(last) = &task.last_effect {
            effects.insert(0, last.clone());
        }
        self.error_effects = Some(effects);
    }
}

#[derive(Clone, Copy)]
enum JoinKind {
    Gather,
    Race,
}
