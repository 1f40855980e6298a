//! Lock-free time-domain analyser tap.
//!
//! The audio thread writes through [`AnalyserInput`]; the draw thread reads
//! through [`AnalyserNode`]. Both sides only touch atomics, so a read can race a
//! write and observe a window that is partly one block old. The scope treats
//! that as current data.

use super::SignalSource;
use crate::util::audio::{BYTE_MIDPOINT, DEFAULT_SAMPLE_RATE, mixdown_frame, sample_to_byte};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

pub const DEFAULT_BUFFER_LEN: usize = 1_024;
pub const MIN_BUFFER_LEN: usize = 32;
pub const MAX_BUFFER_LEN: usize = 32_768;

struct SharedRing {
    bytes: Box<[AtomicU8]>,
    // Index of the next slot to write, monotonically increasing.
    head: AtomicUsize,
}

impl SharedRing {
    fn new(len: usize) -> Self {
        Self {
            bytes: (0..len).map(|_| AtomicU8::new(BYTE_MIDPOINT)).collect(),
            head: AtomicUsize::new(0),
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.bytes.len()
    }

    fn reserve(&self, count: usize) -> usize {
        self.head.fetch_add(count, Ordering::AcqRel)
    }

    #[inline]
    fn store(&self, position: usize, byte: u8) {
        self.bytes[position % self.len()].store(byte, Ordering::Relaxed);
    }
}

/// Read side of the tap. Owned by the sampler.
pub struct AnalyserNode {
    ring: Arc<SharedRing>,
    sample_rate: f32,
}

impl std::fmt::Debug for AnalyserNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyserNode")
            .field("buffer_len", &self.ring.len())
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}

impl AnalyserNode {
    pub fn new(buffer_len: usize, sample_rate: f32) -> Self {
        let buffer_len = buffer_len.clamp(MIN_BUFFER_LEN, MAX_BUFFER_LEN);
        let sample_rate = if sample_rate.is_finite() && sample_rate > 0.0 {
            sample_rate
        } else {
            DEFAULT_SAMPLE_RATE
        };
        Self {
            ring: Arc::new(SharedRing::new(buffer_len)),
            sample_rate,
        }
    }
}

impl Default for AnalyserNode {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_LEN, DEFAULT_SAMPLE_RATE)
    }
}

impl SignalSource for AnalyserNode {
    type Input = AnalyserInput;

    fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    fn buffer_len(&self) -> usize {
        self.ring.len()
    }

    fn read_time_domain(&self, out: &mut [u8]) {
        let len = self.ring.len();
        let head = self.ring.head.load(Ordering::Acquire);
        // Reads longer than the ring are padded with silence before the oldest sample.
        let (padding, tail) = out.split_at_mut(out.len().saturating_sub(len));
        padding.fill(BYTE_MIDPOINT);
        // Newest `tail.len()` samples end just before `head`.
        let start = head + len - tail.len();
        for (offset, byte) in tail.iter_mut().enumerate() {
            *byte = self.ring.bytes[(start + offset) % len].load(Ordering::Relaxed);
        }
    }

    fn input(&self) -> AnalyserInput {
        AnalyserInput {
            ring: Arc::clone(&self.ring),
        }
    }
}

/// Write side of the tap, handed to whatever produces audio.
///
/// Cloning yields another writer into the same ring; concurrent writers
/// interleave by block.
#[derive(Clone)]
pub struct AnalyserInput {
    ring: Arc<SharedRing>,
}

impl std::fmt::Debug for AnalyserInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyserInput")
            .field("buffer_len", &self.ring.len())
            .finish()
    }
}

impl AnalyserInput {
    /// Appends mono samples in -1..1. Only the newest `buffer_len` survive.
    pub fn write(&self, samples: &[f32]) {
        let len = self.ring.len();
        let skip = samples.len().saturating_sub(len);
        let kept = &samples[skip..];
        let start = self.ring.reserve(kept.len());
        for (offset, &sample) in kept.iter().enumerate() {
            self.ring.store(start + offset, sample_to_byte(sample));
        }
    }

    /// Appends interleaved frames, averaging channels down to mono.
    pub fn write_interleaved(&self, samples: &[f32], channels: usize) {
        if channels <= 1 {
            self.write(samples);
            return;
        }

        let len = self.ring.len();
        let frames = samples.len() / channels;
        let skip = frames.saturating_sub(len);
        let start = self.ring.reserve(frames - skip);
        for (offset, frame) in samples.chunks_exact(channels).skip(skip).enumerate() {
            self.ring
                .store(start + offset, sample_to_byte(mixdown_frame(frame)));
        }
    }

    pub fn buffer_len(&self) -> usize {
        self.ring.len()
    }
}
