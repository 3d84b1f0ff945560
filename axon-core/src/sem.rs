//! Counting semaphores with FIFO waiter queues.

use crate::error::VmError;
use crate::handler::ResumeToken;
use crate::id::{SemaphoreId, TaskId};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

struct SemState {
    permits: u32,
    /// Permits currently held by tasks. Releasing past zero is a
    /// resource error.
    outstanding: u32,
    waiters: VecDeque<ResumeToken>,
}

/// A cloneable semaphore handle.
///
/// The state lives in the handle itself, so the semaphore handler can
/// operate on it without reaching into the machine. Waiters are resumed
/// in the exact order their acquisitions blocked. A permit acquired by a
/// task that is later cancelled is *not* auto-released; guard
/// acquisitions with `Safe` and an explicit release if the program can
/// be cancelled while holding one.
#[derive(Clone)]
pub struct Semaphore {
    id: SemaphoreId,
    state: Arc<Mutex<SemState>>,
}

impl Semaphore {
    /// Create a semaphore. Only the machine calls this (via the
    /// `SemCreate` effect) so ids stay monotonic within a run.
    pub fn new(id: SemaphoreId, permits: u32) -> Self {
        Self {
            id,
            state: Arc::new(Mutex::new(SemState {
                permits,
                outstanding: 0,
                waiters: VecDeque::new(),
            })),
        }
    }

    /// This semaphore's id.
    pub fn id(&self) -> SemaphoreId {
        self.id
    }

    /// Take a permit if one is free.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock();
        if state.permits > 0 {
            state.permits -= 1;
            state.outstanding += 1;
            true
        } else {
            false
        }
    }

    /// Park a blocked acquirer at the tail of the FIFO queue.
    pub fn enqueue_waiter(&self, token: ResumeToken) {
        self.state.lock().waiters.push_back(token);
    }

    /// Release one permit. If a waiter is queued, the permit transfers
    /// directly to it and its resume token is returned; otherwise the
    /// permit count grows back. Releasing more than was acquired is a
    /// [`VmError::Resource`].
    pub fn release(&self) -> Result<Option<ResumeToken>, VmError> {
        let mut state = self.state.lock();
        if state.outstanding == 0 {
            return Err(VmError::Resource(format!(
                "semaphore {} released more permits than were acquired",
                self.id
            )));
        }
        match state.waiters.pop_front() {
            // The waiter inherits the permit: outstanding is unchanged.
            Some(token) => Ok(Some(token)),
            None => {
                state.outstanding -= 1;
                state.permits += 1;
                Ok(None)
            }
        }
    }

    /// Drop a cancelled task from the waiter queue. Returns true if it
    /// was queued. The task never held a permit, so none is consumed.
    pub fn purge_waiter(&self, task: TaskId) -> bool {
        let mut state = self.state.lock();
        let before = state.waiters.len();
        state.waiters.retain(|t| t.task() != task);
        state.waiters.len() != before
    }

    /// Free permits right now.
    pub fn available(&self) -> u32 {
        self.state.lock().permits
    }

    /// Queued waiters right now.
    pub fn queued(&self) -> usize {
        self.state.lock().waiters.len()
    }
}

impl fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Semaphore")
            .field("id", &self.id)
            .field("permits", &state.permits)
            .field("waiters", &state.waiters.len())
            .finish()
    }
}

impl PartialEq for Semaphore {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}
