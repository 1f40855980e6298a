//! Triggered sampling for the oscilloscope.

use crate::audio::SignalSource;
use crate::util::audio::BYTE_MIDPOINT;
use tracing::trace;

/// One triggered window borrowed from the sampler's buffer.
///
/// The borrow ends before the next [`Sampler::sample`] call; use
/// [`SampleWindow::to_frame`] to keep the data around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleWindow<'a> {
    pub data: &'a [u8],
    pub trigger_index: usize,
}

impl<'a> SampleWindow<'a> {
    pub fn new(data: &'a [u8], trigger_index: usize) -> Self {
        Self {
            data,
            trigger_index,
        }
    }

    /// Builds a window over `data` with its trigger computed in place.
    pub fn triggered(data: &'a [u8]) -> Self {
        Self::new(data, trigger_index(data))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn to_frame(&self) -> SampleFrame {
        SampleFrame {
            data: self.data.to_vec(),
            trigger_index: self.trigger_index,
        }
    }
}

/// Owned copy of a [`SampleWindow`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleFrame {
    pub data: Vec<u8>,
    pub trigger_index: usize,
}

impl SampleFrame {
    pub fn window(&self) -> SampleWindow<'_> {
        SampleWindow::new(&self.data, self.trigger_index)
    }
}

/// Offset of the first rising crossing of the midpoint, or 0 if there is none.
///
/// Returns `i - 1` for the first `i` with `data[i] >= 128` and `data[i - 1] < 128`.
/// An edge at index 0 and a missing edge are indistinguishable.
pub fn trigger_index(data: &[u8]) -> usize {
    data.windows(2)
        .position(|pair| pair[0] < BYTE_MIDPOINT && pair[1] >= BYTE_MIDPOINT)
        .unwrap_or(0)
}

/// Pulls fixed-size windows from a signal source and locates the trigger.
#[derive(Debug)]
pub struct Sampler<S> {
    source: S,
    buffer: Vec<u8>,
}

impl<S: SignalSource> Sampler<S> {
    pub fn new(source: S) -> Self {
        let buffer = vec![BYTE_MIDPOINT; source.buffer_len()];
        Self { source, buffer }
    }

    pub fn sample(&mut self) -> SampleWindow<'_> {
        self.source.read_time_domain(&mut self.buffer);
        let trigger = trigger_index(&self.buffer);
        if trigger == 0 {
            trace!("[sampler] no rising edge; free-running from offset 0");
        }
        SampleWindow::new(&self.buffer, trigger)
    }

    /// Where an external audio graph should route signal into this sampler.
    pub fn input(&self) -> S::Input {
        self.source.input()
    }

    pub fn sample_rate(&self) -> f32 {
        self.source.sample_rate()
    }

    pub fn window_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
