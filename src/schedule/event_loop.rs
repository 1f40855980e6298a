//! Single-threaded host loop providing timers and display-refresh callbacks.
//!
//! Time is tracked as an offset from loop creation. With [`Pacing::Virtual`]
//! the clock jumps straight to the next event, which keeps tests
//! deterministic; [`Pacing::RealTime`] sleeps until each deadline and moves
//! the clock forward by however long callbacks actually took, so delays are
//! measured from when they were requested.

use super::{FrameId, Host, Task, TimerId};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};
use tracing::trace;

pub const DEFAULT_REFRESH_RATE: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pacing {
    Virtual,
    RealTime,
}

#[derive(Default)]
struct LoopState {
    now: Duration,
    next_id: u64,
    timers: BTreeMap<(Duration, u64), Task>,
    timer_deadlines: HashMap<u64, Duration>,
    frames: BTreeMap<u64, Task>,
    fired: u64,
    cancelled: u64,
}

impl LoopState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn next_vsync(&self, interval: Duration) -> Duration {
        let interval = interval.as_nanos().max(1);
        let ticks = self.now.as_nanos() / interval + 1;
        Duration::from_nanos((ticks * interval) as u64)
    }

    fn next_event(&self, refresh_interval: Duration) -> Option<(Duration, EventKind)> {
        let timer = self
            .timers
            .keys()
            .next()
            .map(|&(deadline, _)| (deadline, EventKind::Timer));
        let frame = (!self.frames.is_empty())
            .then(|| (self.next_vsync(refresh_interval), EventKind::Frame));

        match (timer, frame) {
            (Some(t), Some(f)) => Some(if t.0 <= f.0 { t } else { f }),
            (t, f) => t.or(f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    Timer,
    Frame,
}

pub struct EventLoop {
    refresh_interval: Duration,
    pacing: Pacing,
    origin: Instant,
    state: RefCell<LoopState>,
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("EventLoop")
            .field("refresh_interval", &self.refresh_interval)
            .field("pacing", &self.pacing)
            .field("now", &state.now)
            .field("pending_timers", &state.timers.len())
            .field("pending_frames", &state.frames.len())
            .finish()
    }
}

impl EventLoop {
    pub fn new(refresh_rate: f32, pacing: Pacing) -> Self {
        let refresh_rate = if refresh_rate.is_finite() && refresh_rate > 0.0 {
            refresh_rate
        } else {
            DEFAULT_REFRESH_RATE
        };
        Self {
            refresh_interval: Duration::from_nanos((1e9 / f64::from(refresh_rate)).round() as u64),
            pacing,
            origin: Instant::now(),
            state: RefCell::new(LoopState::default()),
        }
    }

    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    pub fn pending_frames(&self) -> usize {
        self.state.borrow().frames.len()
    }

    pub fn fired_count(&self) -> u64 {
        self.state.borrow().fired
    }

    pub fn cancelled_count(&self) -> u64 {
        self.state.borrow().cancelled
    }

    pub fn run_for(&self, duration: Duration) {
        let deadline = self.now() + duration;
        self.run_until(deadline);
    }

    /// Runs every event due at or before `deadline`, then parks the clock there.
    pub fn run_until(&self, deadline: Duration) {
        loop {
            let next = self.state.borrow().next_event(self.refresh_interval);
            let Some((at, kind)) = next else {
                break;
            };
            if at > deadline {
                break;
            }
            self.advance_to(at);
            match kind {
                EventKind::Timer => self.fire_timer(),
                EventKind::Frame => self.fire_frames(),
            }
        }
        self.advance_to(deadline);
    }

    /// Catches the clock up with wall time. No-op under virtual pacing.
    fn sync_clock(&self, state: &mut LoopState) {
        if self.pacing == Pacing::RealTime {
            state.now = state.now.max(self.origin.elapsed());
        }
    }

    fn advance_to(&self, at: Duration) {
        if at <= self.now() {
            return;
        }
        if self.pacing == Pacing::RealTime {
            let target = self.origin + at;
            std::thread::sleep(target.saturating_duration_since(Instant::now()));
        }
        self.state.borrow_mut().now = at;
    }

    fn fire_timer(&self) {
        let task = {
            let mut state = self.state.borrow_mut();
            let Some(((_, id), task)) = state.timers.pop_first() else {
                return;
            };
            state.timer_deadlines.remove(&id);
            state.fired += 1;
            task
        };
        task();
        self.sync_clock(&mut self.state.borrow_mut());
    }

    fn fire_frames(&self) {
        // Frames requested by these callbacks wait for the following refresh.
        let frames = {
            let mut state = self.state.borrow_mut();
            let frames = std::mem::take(&mut state.frames);
            state.fired += frames.len() as u64;
            frames
        };
        trace!("[event-loop] refresh with {} frame callbacks", frames.len());
        for task in frames.into_values() {
            task();
        }
        self.sync_clock(&mut self.state.borrow_mut());
    }
}

impl Host for EventLoop {
    fn set_timeout(&self, delay: Duration, task: Task) -> TimerId {
        let mut state = self.state.borrow_mut();
        self.sync_clock(&mut state);
        let id = state.next_id();
        let deadline = state.now + delay;
        state.timers.insert((deadline, id), task);
        state.timer_deadlines.insert(id, deadline);
        TimerId(id)
    }

    fn clear_timeout(&self, TimerId(id): TimerId) {
        let task = {
            let mut state = self.state.borrow_mut();
            let Some(deadline) = state.timer_deadlines.remove(&id) else {
                return;
            };
            state.cancelled += 1;
            state.timers.remove(&(deadline, id))
        };
        drop(task);
    }

    fn request_frame(&self, task: Task) -> FrameId {
        let mut state = self.state.borrow_mut();
        self.sync_clock(&mut state);
        let id = state.next_id();
        state.frames.insert(id, task);
        FrameId(id)
    }

    fn cancel_frame(&self, FrameId(id): FrameId) {
        let task = {
            let mut state = self.state.borrow_mut();
            let task = state.frames.remove(&id);
            if task.is_some() {
                state.cancelled += 1;
            }
            task
        };
        drop(task);
    }
}
