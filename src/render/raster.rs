//! Software RGB rasteriser.
//!
//! Lines are stamped as axis-aligned squares of the stroke width along each
//! segment, which is enough for grid lines and a scope trace.

use super::common::{Color, Point, Rect, Size, StrokeStyle, Surface};
use bytemuck::Zeroable;
use std::io::{self, Write};

#[derive(Debug, Clone)]
pub struct RasterSurface {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
    stroke: StrokeStyle,
    // Sub-paths of the current path.
    path: Vec<Vec<Point>>,
}

impl RasterSurface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::zeroed(); width * height],
            stroke: StrokeStyle::default(),
            path: Vec::new(),
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    /// Packed RGB bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Writes a binary PPM (P6) image.
    pub fn write_ppm<W: Write>(&self, mut writer: W) -> io::Result<()> {
        write!(writer, "P6\n{} {}\n255\n", self.width, self.height)?;
        writer.write_all(self.as_bytes())?;
        writer.flush()
    }

    #[inline]
    fn put(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        self.pixels[idx] = color;
    }

    fn stamp(&mut self, center: Point, side: i64, color: Color) {
        let half = side as f32 * 0.5;
        let x0 = (center.x - half + 0.5).floor() as i64;
        let y0 = (center.y - half + 0.5).floor() as i64;
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                self.put(x, y, color);
            }
        }
    }

    fn draw_segment(&mut self, from: Point, to: Point, side: i64, color: Color) {
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0);
        if !steps.is_finite() {
            return;
        }
        let steps = steps as i64;
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            self.stamp(
                Point::new(from.x + dx * t, from.y + dy * t),
                side,
                color,
            );
        }
    }
}

impl Surface for RasterSurface {
    fn size(&self) -> Size {
        Size::new(self.width as f32, self.height as f32)
    }

    fn clear(&mut self) {
        self.pixels.fill(Color::zeroed());
        self.path.clear();
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let x0 = rect.x.max(0.0).round() as usize;
        let y0 = rect.y.max(0.0).round() as usize;
        let x1 = ((rect.x + rect.width).round().max(0.0) as usize).min(self.width);
        let y1 = ((rect.y + rect.height).round().max(0.0) as usize).min(self.height);
        for y in y0..y1 {
            let row = y * self.width;
            self.pixels[row + x0.min(x1)..row + x1].fill(color);
        }
    }

    fn set_stroke(&mut self, style: StrokeStyle) {
        self.stroke = style;
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, point: Point) {
        self.path.push(vec![point]);
    }

    fn line_to(&mut self, point: Point) {
        // A line_to without a current point starts the sub-path, as on a canvas.
        match self.path.last_mut() {
            Some(sub_path) => sub_path.push(point),
            None => self.path.push(vec![point]),
        }
    }

    fn stroke(&mut self) {
        let side = (self.stroke.width.round() as i64).max(1);
        let color = self.stroke.color;
        let path = std::mem::take(&mut self.path);
        for sub_path in &path {
            for pair in sub_path.windows(2) {
                self.draw_segment(pair[0], pair[1], side, color);
            }
        }
        self.path = path;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::rgb(255, 0, 0);
    const WHITE: Color = Color::rgb(255, 255, 255);

    #[test]
    fn fill_rect_clips_to_bounds() {
        let mut surface = RasterSurface::new(8, 4);
        surface.fill_rect(Rect::new(-2.0, 1.0, 100.0, 2.0), RED);
        assert_eq!(surface.pixel(0, 0), Some(Color::rgb(0, 0, 0)));
        assert_eq!(surface.pixel(0, 1), Some(RED));
        assert_eq!(surface.pixel(7, 2), Some(RED));
        assert_eq!(surface.pixel(7, 3), Some(Color::rgb(0, 0, 0)));
        assert_eq!(surface.pixel(8, 0), None);
    }

    #[test]
    fn strokes_horizontal_line() {
        let mut surface = RasterSurface::new(10, 10);
        surface.set_stroke(StrokeStyle::new(WHITE, 1.0));
        surface.stroke_line(Point::new(0.0, 5.0), Point::new(9.0, 5.0));
        for x in 0..10 {
            assert_eq!(surface.pixel(x, 5), Some(WHITE), "x={x}");
        }
        assert_eq!(surface.pixel(4, 3), Some(Color::rgb(0, 0, 0)));
    }

    #[test]
    fn wide_strokes_cover_neighbours() {
        let mut surface = RasterSurface::new(10, 10);
        surface.set_stroke(StrokeStyle::new(RED, 4.0));
        surface.stroke_line(Point::new(5.0, 0.0), Point::new(5.0, 9.0));
        for x in 3..7 {
            assert_eq!(surface.pixel(x, 4), Some(RED), "x={x}");
        }
        assert_eq!(surface.pixel(8, 4), Some(Color::rgb(0, 0, 0)));
    }

    #[test]
    fn ppm_header_and_payload() {
        let mut surface = RasterSurface::new(2, 1);
        surface.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), RED);
        let mut out = Vec::new();
        surface.write_ppm(&mut out).expect("write to vec");
        let header = b"P6\n2 1\n255\n";
        assert_eq!(&out[..header.len()], header);
        assert_eq!(&out[header.len()..], &[255, 0, 0, 0, 0, 0]);
    }
}
