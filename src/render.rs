pub mod common;
pub mod oscilloscope;
pub mod raster;
pub mod recorder;

pub use common::{Color, Point, Rect, Size, StrokeStyle, Surface};
pub use oscilloscope::{ScopeRenderer, ScopeStyle, Scaling, TraceGeometry};
pub use raster::RasterSurface;
pub use recorder::{CommandRecorder, DrawCommand};
