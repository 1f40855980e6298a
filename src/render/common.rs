//! Primitives shared by every drawing surface.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// 8-bit sRGB color, laid out as packed RGB bytes.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Pod, Zeroable,
)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `0xRRGGBB`.
    pub const fn from_hex(hex: u32) -> Self {
        Self::rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f32,
}

impl StrokeStyle {
    pub const fn new(color: Color, width: f32) -> Self {
        Self { color, width }
    }
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self::new(Color::rgb(0, 0, 0), 1.0)
    }
}

/// Fixed-size 2D raster target with canvas-style path drawing.
///
/// Paths follow the usual canvas model: `begin_path` discards the current
/// path, `move_to` starts a sub-path, `line_to` extends it and `stroke` paints
/// it with the current stroke style.
pub trait Surface {
    fn size(&self) -> Size;
    fn clear(&mut self);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn set_stroke(&mut self, style: StrokeStyle);
    fn begin_path(&mut self);
    fn move_to(&mut self, point: Point);
    fn line_to(&mut self, point: Point);
    fn stroke(&mut self);

    /// Strokes a single segment as its own path.
    fn stroke_line(&mut self, from: Point, to: Point) {
        self.begin_path();
        self.move_to(from);
        self.line_to(to);
        self.stroke();
    }
}

impl<S: Surface + ?Sized> Surface for &mut S {
    fn size(&self) -> Size {
        (**self).size()
    }
    fn clear(&mut self) {
        (**self).clear()
    }
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        (**self).fill_rect(rect, color)
    }
    fn set_stroke(&mut self, style: StrokeStyle) {
        (**self).set_stroke(style)
    }
    fn begin_path(&mut self) {
        (**self).begin_path()
    }
    fn move_to(&mut self, point: Point) {
        (**self).move_to(point)
    }
    fn line_to(&mut self, point: Point) {
        (**self).line_to(point)
    }
    fn stroke(&mut self) {
        (**self).stroke()
    }
}
