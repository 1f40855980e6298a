//! Triggered oscilloscope core.
//!
//! A [`Sampler`] reads byte amplitudes from an analyser tap and finds a rising
//! edge to trigger on, a [`ScopeRenderer`] turns that window into grid and
//! trace drawing commands, and a [`DrawBatch`] repeats the pair at a fixed
//! rate or in step with the display.

pub mod audio;
pub mod dsp;
pub mod render;
pub mod schedule;
pub mod settings;
pub mod theme;
pub mod util;

pub use audio::{AnalyserInput, AnalyserNode, SignalSource};
pub use dsp::oscilloscope::{SampleFrame, SampleWindow, Sampler, trigger_index};
pub use render::{ScopeRenderer, Scaling, Surface};
pub use schedule::{Cadence, DrawBatch, EventLoop, Host, Pacing};
pub use settings::ScopeSettings;
