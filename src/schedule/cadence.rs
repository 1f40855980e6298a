use super::{CancelHandle, Host, Task};
use std::time::Duration;

/// How the next draw cycle is scheduled once the current one finishes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cadence {
    /// Fixed delay between the end of one cycle and the start of the next.
    FixedRate { interval: Duration },
    /// Next display refresh.
    DisplaySync,
}

impl Cadence {
    /// `None`, zero, negative or non-finite rates select [`Cadence::DisplaySync`].
    pub fn from_fps(fps: Option<f32>) -> Self {
        match fps {
            Some(fps) if fps.is_finite() && fps > 0.0 => Self::FixedRate {
                interval: Duration::from_nanos(((1e9 / f64::from(fps)).round() as u64).max(1)),
            },
            _ => Self::DisplaySync,
        }
    }

    pub fn schedule_next(&self, host: &dyn Host, task: Task) -> CancelHandle {
        match *self {
            Self::FixedRate { interval } => CancelHandle::Timer(host.set_timeout(interval, task)),
            Self::DisplaySync => CancelHandle::Frame(host.request_frame(task)),
        }
    }
}
