//! Cooperative draw scheduling on a single host thread.

pub mod batch;
pub mod cadence;
pub mod event_loop;

pub use batch::DrawBatch;
pub use cadence::Cadence;
pub use event_loop::{EventLoop, Pacing};

use std::time::Duration;

/// One-shot continuation run by the host.
pub type Task = Box<dyn FnOnce()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u64);

/// Scheduler primitives provided by whatever owns the render thread.
///
/// Cancelling an id that already fired or was already cancelled is a no-op.
pub trait Host {
    /// Runs `task` once after `delay`.
    fn set_timeout(&self, delay: Duration, task: Task) -> TimerId;
    fn clear_timeout(&self, id: TimerId);
    /// Runs `task` once at the next display refresh.
    fn request_frame(&self, task: Task) -> FrameId;
    fn cancel_frame(&self, id: FrameId);
}

/// Handle for one scheduled cycle. Cancelling consumes it.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping a cancel handle leaves the cycle scheduled"]
pub enum CancelHandle {
    Timer(TimerId),
    Frame(FrameId),
}

impl CancelHandle {
    pub fn cancel(self, host: &dyn Host) {
        match self {
            CancelHandle::Timer(id) => host.clear_timeout(id),
            CancelHandle::Frame(id) => host.cancel_frame(id),
        }
    }
}
