//! Signal sources the oscilloscope can observe.

pub mod analyser;

pub use analyser::{AnalyserInput, AnalyserNode};

/// A continuously refreshed time-domain amplitude buffer.
///
/// Bytes are centred on 128 (zero signal). The buffer is written by a thread
/// outside the scope's control; readers accept data that is one frame stale.
pub trait SignalSource {
    /// Connection point an external audio graph routes signal into.
    type Input;

    fn sample_rate(&self) -> f32;

    /// Fixed number of bytes produced by [`SignalSource::read_time_domain`].
    fn buffer_len(&self) -> usize;

    /// Copies the most recent samples into `out`, oldest first.
    fn read_time_domain(&self, out: &mut [u8]);

    fn input(&self) -> Self::Input;
}
