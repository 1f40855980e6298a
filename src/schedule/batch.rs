//! Self-rescheduling draw loop.
//!
//! A batch is `Idle`, `Scheduled` (waiting on the host) or `Running` (inside
//! its callbacks). Each `start` mints a fresh [`CycleToken`]; the continuation
//! handed to the host carries it by value and does nothing unless the batch is
//! still scheduled under that same token. The next cycle is only requested
//! after every callback has returned, so a slow callback pushes the following
//! cycle back instead of overlapping it.

use super::{Cadence, CancelHandle, Host};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

type DrawCallback = Box<dyn FnMut()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CycleToken(u64);

#[derive(Debug)]
enum CycleState {
    Idle,
    Scheduled {
        token: CycleToken,
        handle: CancelHandle,
    },
    Running {
        token: CycleToken,
    },
}

struct BatchInner {
    host: Rc<dyn Host>,
    cadence: Cadence,
    callbacks: RefCell<Vec<DrawCallback>>,
    state: RefCell<CycleState>,
    next_token: Cell<u64>,
    cycles: Cell<u64>,
    in_cycle: Cell<bool>,
    /// Start requested from inside a callback; its first cycle runs once the current one ends.
    deferred_start: Cell<Option<CycleToken>>,
}

impl BatchInner {
    fn mint_token(&self) -> CycleToken {
        let token = self.next_token.get() + 1;
        self.next_token.set(token);
        CycleToken(token)
    }

    fn is_running(&self, token: CycleToken) -> bool {
        matches!(*self.state.borrow(), CycleState::Running { token: current } if current == token)
    }

    /// Host continuation for a scheduled cycle.
    fn resume(inner: &Rc<Self>, token: CycleToken) {
        {
            let mut state = inner.state.borrow_mut();
            match *state {
                CycleState::Scheduled { token: current, .. } if current == token => {}
                _ => {
                    trace!("[draw-batch] stale continuation {token:?} ignored");
                    return;
                }
            }
            *state = CycleState::Running { token };
        }
        Self::run_cycle(inner, token);
    }

    /// Runs every callback, then schedules the next cycle if still running under `token`.
    fn run_cycle(inner: &Rc<Self>, token: CycleToken) {
        // Callbacks may call back into the batch, so none of its cells stay borrowed here.
        let mut callbacks = std::mem::take(&mut *inner.callbacks.borrow_mut());
        inner.in_cycle.set(true);
        for callback in callbacks.iter_mut() {
            callback();
        }
        inner.in_cycle.set(false);
        {
            let mut slot = inner.callbacks.borrow_mut();
            let added = std::mem::replace(&mut *slot, callbacks);
            slot.extend(added);
        }
        inner.cycles.set(inner.cycles.get() + 1);

        if let Some(restart) = inner.deferred_start.take() {
            if inner.is_running(restart) {
                trace!("[draw-batch] running deferred start {restart:?}");
                Self::run_cycle(inner, restart);
                return;
            }
        }

        if !inner.is_running(token) {
            trace!("[draw-batch] cycle {token:?} ended after stop; not rescheduling");
            return;
        }

        let weak: Weak<Self> = Rc::downgrade(inner);
        let handle = inner.cadence.schedule_next(
            &*inner.host,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    BatchInner::resume(&inner, token);
                }
            }),
        );
        *inner.state.borrow_mut() = CycleState::Scheduled { token, handle };
    }
}

impl Drop for BatchInner {
    fn drop(&mut self) {
        let state = std::mem::replace(self.state.get_mut(), CycleState::Idle);
        if let CycleState::Scheduled { handle, .. } = state {
            handle.cancel(&*self.host);
        }
    }
}

/// Repeating invocation of registered draw callbacks.
///
/// Not `Send`: the batch lives on the host's render thread.
pub struct DrawBatch {
    inner: Rc<BatchInner>,
}

impl std::fmt::Debug for DrawBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawBatch")
            .field("cadence", &self.inner.cadence)
            .field("callbacks", &self.inner.callbacks.borrow().len())
            .field("state", &*self.inner.state.borrow())
            .field("cycles", &self.inner.cycles.get())
            .finish()
    }
}

impl DrawBatch {
    pub fn new(host: Rc<dyn Host>, cadence: Cadence) -> Self {
        Self {
            inner: Rc::new(BatchInner {
                host,
                cadence,
                callbacks: RefCell::new(Vec::new()),
                state: RefCell::new(CycleState::Idle),
                next_token: Cell::new(0),
                cycles: Cell::new(0),
                in_cycle: Cell::new(false),
                deferred_start: Cell::new(None),
            }),
        }
    }

    /// Fixed-rate batch when `fps` is a positive rate, display-synced otherwise.
    pub fn with_fps(host: Rc<dyn Host>, fps: Option<f32>) -> Self {
        Self::new(host, Cadence::from_fps(fps))
    }

    /// Appends a callback; callbacks run in registration order every cycle.
    pub fn add(&self, callback: impl FnMut() + 'static) {
        self.inner.callbacks.borrow_mut().push(Box::new(callback));
    }

    pub fn is_drawing(&self) -> bool {
        !matches!(*self.inner.state.borrow(), CycleState::Idle)
    }

    /// Runs a cycle now and keeps cycling until [`DrawBatch::stop`]. No-op while drawing.
    pub fn start(&self) {
        if self.is_drawing() {
            debug!("[draw-batch] start ignored; already drawing");
            return;
        }
        let token = self.inner.mint_token();
        *self.inner.state.borrow_mut() = CycleState::Running { token };
        debug!(
            "[draw-batch] started {token:?} ({:?}, {} callbacks)",
            self.inner.cadence,
            self.inner.callbacks.borrow().len()
        );
        if self.inner.in_cycle.get() {
            // The callback list is checked out by the running cycle.
            self.inner.deferred_start.set(Some(token));
            return;
        }
        BatchInner::run_cycle(&self.inner, token);
    }

    /// Cancels the pending cycle. No-op when idle.
    pub fn stop(&self) {
        let previous = std::mem::replace(&mut *self.inner.state.borrow_mut(), CycleState::Idle);
        match previous {
            CycleState::Idle => trace!("[draw-batch] stop ignored; not drawing"),
            CycleState::Scheduled { token, handle } => {
                handle.cancel(&*self.inner.host);
                debug!("[draw-batch] stopped {token:?}");
            }
            CycleState::Running { token } => {
                debug!("[draw-batch] stopped {token:?} mid-cycle");
            }
        }
    }

    pub fn toggle(&self) {
        if self.is_drawing() {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Completed cycles over the batch's lifetime.
    pub fn cycles(&self) -> u64 {
        self.inner.cycles.get()
    }

    pub fn cadence(&self) -> Cadence {
        self.inner.cadence
    }

    /// Handle that callbacks can hold without keeping the batch alive.
    pub fn downgrade(&self) -> WeakDrawBatch {
        WeakDrawBatch {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

#[derive(Clone)]
pub struct WeakDrawBatch {
    inner: Weak<BatchInner>,
}

impl WeakDrawBatch {
    pub fn upgrade(&self) -> Option<DrawBatch> {
        self.inner.upgrade().map(|inner| DrawBatch { inner })
    }
}
