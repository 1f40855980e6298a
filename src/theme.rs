//! Scope palette.

use crate::render::{Color, StrokeStyle};

/// Oscilloscope display: background, graticule, centre axis, trace.
pub mod oscilloscope {
    use super::*;

    pub const BACKGROUND: Color = Color::from_hex(0x11_11_11);
    pub const GRID: StrokeStyle = StrokeStyle::new(Color::from_hex(0xff_ff_ff), 1.0);
    pub const AXIS: StrokeStyle = StrokeStyle::new(Color::from_hex(0x55_55_55), 1.0);
    pub const TRACE: StrokeStyle = StrokeStyle::new(Color::from_hex(0xff_00_00), 4.0);
}
