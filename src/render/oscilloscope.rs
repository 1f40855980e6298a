//! Graticule and trace rendering for one triggered window.

use super::common::{Color, Point, Rect, Size, StrokeStyle, Surface};
use crate::dsp::Reconfigurable;
use crate::dsp::oscilloscope::SampleWindow;
use crate::theme;
use crate::util::audio::{DEFAULT_SAMPLE_RATE, byte_to_voltage};
use serde::{Deserialize, Serialize};
use tracing::trace;

pub const GRID_DIVISIONS_X: usize = 10;
pub const GRID_DIVISIONS_Y: usize = 8;

pub const DEFAULT_SEC_DIV: f64 = 0.01;
pub const DEFAULT_VOLT_DIV: f64 = 1.0;

/// Time and voltage per grid division.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scaling {
    pub sec_div: f64,
    pub volt_div: f64,
}

impl Default for Scaling {
    fn default() -> Self {
        Self {
            sec_div: DEFAULT_SEC_DIV,
            volt_div: DEFAULT_VOLT_DIV,
        }
    }
}

impl Scaling {
    pub const fn new(sec_div: f64, volt_div: f64) -> Self {
        Self { sec_div, volt_div }
    }

    /// Replaces unset (zero, negative or non-finite) fields with the defaults.
    pub fn or_defaults(self) -> Self {
        let pick = |value: f64, default: f64| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                default
            }
        };
        Self {
            sec_div: pick(self.sec_div, DEFAULT_SEC_DIV),
            volt_div: pick(self.volt_div, DEFAULT_VOLT_DIV),
        }
    }
}

/// Horizontal layout of the trace for the current scaling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceGeometry {
    pub samples_per_division: f64,
    pub total_samples: usize,
    pub x_step: f32,
}

impl TraceGeometry {
    /// `None` when the scaling shows less than one sample across the screen.
    pub fn compute(scaling: Scaling, sample_rate: f32, width: f32) -> Option<Self> {
        let samples_per_division = scaling.sec_div * f64::from(sample_rate);
        let total = (samples_per_division * GRID_DIVISIONS_X as f64).floor();
        if total.is_nan() || total < 1.0 {
            return None;
        }
        Some(Self {
            samples_per_division,
            total_samples: total as usize,
            x_step: (f64::from(width) / total) as f32,
        })
    }
}

/// Poly-line through the window starting at its trigger.
///
/// Yields at most `geometry.total_samples` points and stops early when the
/// window runs out.
pub fn trace_points<'a>(
    window: SampleWindow<'a>,
    geometry: TraceGeometry,
    height: f32,
    volt_div: f64,
) -> impl Iterator<Item = Point> + 'a {
    let center = f64::from(height) * 0.5;
    let volts_per_canvas = GRID_DIVISIONS_Y as f64 * volt_div;
    let pixels_per_volt = f64::from(height) / volts_per_canvas;

    window
        .data
        .iter()
        .skip(window.trigger_index)
        .take(geometry.total_samples)
        .enumerate()
        .map(move |(step, &byte)| {
            let offset = f64::from(byte_to_voltage(byte)) * pixels_per_volt;
            Point::new(step as f32 * geometry.x_step, (center - offset) as f32)
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScopeStyle {
    pub background: Color,
    pub grid: StrokeStyle,
    pub axis: StrokeStyle,
    pub trace: StrokeStyle,
}

impl Default for ScopeStyle {
    fn default() -> Self {
        Self {
            background: theme::oscilloscope::BACKGROUND,
            grid: theme::oscilloscope::GRID,
            axis: theme::oscilloscope::AXIS,
            trace: theme::oscilloscope::TRACE,
        }
    }
}

/// Paints sample windows onto a fixed-size surface.
#[derive(Debug)]
pub struct ScopeRenderer<S> {
    surface: S,
    size: Size,
    scaling: Scaling,
    sample_rate: f32,
    style: ScopeStyle,
}

impl<S: Surface> ScopeRenderer<S> {
    /// Captures the surface size once; later resizes of the surface are ignored.
    pub fn new(surface: S, scaling: Option<Scaling>) -> Self {
        let size = surface.size();
        Self {
            surface,
            size,
            scaling: scaling.unwrap_or_default().or_defaults(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            style: ScopeStyle::default(),
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        if sample_rate.is_finite() && sample_rate > 0.0 {
            self.sample_rate = sample_rate;
        }
        self
    }

    pub fn with_style(mut self, style: ScopeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn set_scaling(&mut self, sec_div: f64, volt_div: f64) {
        self.scaling = Scaling::new(sec_div, volt_div);
    }

    pub fn scaling(&self) -> Scaling {
        self.scaling
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn trace_geometry(&self) -> Option<TraceGeometry> {
        TraceGeometry::compute(self.scaling, self.sample_rate, self.size.width)
    }

    pub fn trace_points(&self, window: &SampleWindow<'_>) -> Vec<Point> {
        match self.trace_geometry() {
            Some(geometry) if self.volt_div_is_drawable() => {
                trace_points(*window, geometry, self.size.height, self.scaling.volt_div).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn draw(&mut self, sample: &SampleWindow<'_>) -> &mut Self {
        let Size { width, height } = self.size;

        self.surface.clear();
        self.surface
            .fill_rect(Rect::from_size(self.size), self.style.background);
        self.draw_grid();

        self.surface.set_stroke(self.style.axis);
        self.surface.stroke_line(
            Point::new(0.0, height * 0.5),
            Point::new(width, height * 0.5),
        );

        let Some(geometry) = self.trace_geometry() else {
            trace!(
                "[scope] sec/div {} yields no samples; drawing grid only",
                self.scaling.sec_div
            );
            return self;
        };
        if !self.volt_div_is_drawable() {
            trace!(
                "[scope] volt/div {} is not drawable; drawing grid only",
                self.scaling.volt_div
            );
            return self;
        }

        self.surface.set_stroke(self.style.trace);
        self.surface.begin_path();
        for (step, point) in
            trace_points(*sample, geometry, height, self.scaling.volt_div).enumerate()
        {
            if step == 0 {
                self.surface.move_to(point);
            } else {
                self.surface.line_to(point);
            }
        }
        self.surface.stroke();
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    fn volt_div_is_drawable(&self) -> bool {
        self.scaling.volt_div.is_finite() && self.scaling.volt_div > 0.0
    }

    fn draw_grid(&mut self) {
        let Size { width, height } = self.size;
        let spacing_x = width / GRID_DIVISIONS_X as f32;
        let spacing_y = height / GRID_DIVISIONS_Y as f32;

        self.surface.set_stroke(self.style.grid);
        for row in 0..=GRID_DIVISIONS_Y {
            let y = row as f32 * spacing_y;
            self.surface
                .stroke_line(Point::new(0.0, y), Point::new(width, y));
        }
        for column in 0..=GRID_DIVISIONS_X {
            let x = column as f32 * spacing_x;
            self.surface
                .stroke_line(Point::new(x, 0.0), Point::new(x, height));
        }
    }
}

impl<S: Surface> Reconfigurable<Scaling> for ScopeRenderer<S> {
    fn update_config(&mut self, config: Scaling) {
        self.set_scaling(config.sec_div, config.volt_div);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{CommandRecorder, DrawCommand, RasterSurface};

    const GRID_STROKES: usize = GRID_DIVISIONS_X + 1 + GRID_DIVISIONS_Y + 1;

    fn recorder_renderer(width: f32, height: f32) -> ScopeRenderer<CommandRecorder> {
        ScopeRenderer::new(CommandRecorder::new(width, height), None)
    }

    fn sine_window() -> Vec<u8> {
        (0..1024)
            .map(|i| {
                let phase = i as f32 / 64.0 * std::f32::consts::TAU;
                crate::util::audio::sample_to_byte(0.8 * phase.sin())
            })
            .collect()
    }

    #[test]
    fn default_scaling_matches_reference_geometry() {
        let renderer = recorder_renderer(800.0, 400.0);
        assert_eq!(renderer.scaling(), Scaling::new(0.01, 1.0));

        let geometry = renderer.trace_geometry().expect("default scaling draws");
        assert!((geometry.samples_per_division - 441.0).abs() < 1e-9);
        assert_eq!(geometry.total_samples, 4410);
        assert!((geometry.x_step - 800.0 / 4410.0).abs() < 1e-6);
    }

    #[test]
    fn unset_initial_scaling_falls_back_per_field() {
        let renderer = ScopeRenderer::new(
            CommandRecorder::new(100.0, 100.0),
            Some(Scaling::new(0.0, 2.0)),
        );
        assert_eq!(renderer.scaling(), Scaling::new(DEFAULT_SEC_DIV, 2.0));
    }

    #[test]
    fn full_scale_byte_maps_to_expected_pixel() {
        let renderer = recorder_renderer(800.0, 400.0);
        let data = [255u8; 4];
        let points = renderer.trace_points(&SampleWindow::new(&data, 0));
        assert_eq!(points.len(), 4);
        assert!((points[0].y - 150.4).abs() < 0.05, "y = {}", points[0].y);
        assert!((points[0].y - 150.390_62).abs() < 1e-3);
        assert_eq!(points[0].x, 0.0);
    }

    #[test]
    fn larger_volt_div_shrinks_deviation() {
        let mut renderer = recorder_renderer(800.0, 400.0);
        let data = [200u8; 8];
        let window = SampleWindow::new(&data, 0);

        let mut previous = f32::INFINITY;
        for volt_div in [0.25, 0.5, 1.0, 2.0, 5.0] {
            renderer.set_scaling(0.01, volt_div);
            let deviation = (renderer.trace_points(&window)[0].y - 200.0).abs();
            assert!(deviation > 0.0);
            assert!(
                deviation < previous,
                "volt/div {volt_div}: {deviation} >= {previous}"
            );
            previous = deviation;
        }
    }

    #[test]
    fn larger_sec_div_shows_more_samples() {
        let mut renderer = recorder_renderer(800.0, 400.0);
        let mut previous: Option<TraceGeometry> = None;
        for sec_div in [0.0001, 0.001, 0.01, 0.1] {
            renderer.set_scaling(sec_div, 1.0);
            let geometry = renderer.trace_geometry().expect("drawable");
            if let Some(prev) = previous {
                assert!(geometry.total_samples > prev.total_samples);
                assert!(geometry.x_step < prev.x_step);
            }
            previous = Some(geometry);
        }
    }

    #[test]
    fn trace_starts_at_trigger_and_stops_with_window() {
        let mut renderer = recorder_renderer(100.0, 80.0);
        let mut data = vec![128u8; 16];
        data[5] = 0;
        renderer.set_scaling(0.0001, 1.0);
        let points = renderer.trace_points(&SampleWindow::new(&data, 5));
        assert_eq!(points.len(), 11, "window exhausted before 44 samples");
        assert_eq!(points[0].y, 50.0);
        assert_eq!(points[1].y, 40.0);
    }

    #[test]
    fn trace_is_capped_at_total_samples() {
        let mut renderer = recorder_renderer(100.0, 80.0);
        renderer.set_scaling(0.0001, 1.0);
        let data = sine_window();
        let points = renderer.trace_points(&SampleWindow::new(&data, 3));
        assert_eq!(points.len(), 44);
        let last = points.last().expect("points");
        assert!(last.x < 100.0);
    }

    #[test]
    fn drawing_is_deterministic() {
        let mut renderer = recorder_renderer(640.0, 320.0);
        let data = sine_window();
        let window = SampleWindow::triggered(&data);

        renderer.draw(&window);
        let first = renderer.surface_mut().take();
        renderer.draw(&window);
        let second = renderer.surface_mut().take();

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn draw_order_is_background_grid_axis_trace() {
        let mut renderer = recorder_renderer(640.0, 320.0);
        let data = sine_window();
        renderer.draw(&SampleWindow::triggered(&data));

        let commands = renderer.surface().commands();
        assert_eq!(commands[0], DrawCommand::Clear);
        assert!(matches!(commands[1], DrawCommand::FillRect { color, .. }
            if color == theme::oscilloscope::BACKGROUND));
        assert_eq!(renderer.surface().stroke_count(), GRID_STROKES + 2);

        let strokes: Vec<_> = commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::SetStroke { style } => Some(*style),
                _ => None,
            })
            .collect();
        assert_eq!(
            strokes,
            vec![
                theme::oscilloscope::GRID,
                theme::oscilloscope::AXIS,
                theme::oscilloscope::TRACE
            ]
        );

        let trace_len = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::LineTo { .. }))
            .count()
            - GRID_STROKES
            - 1;
        // 1024 samples minus the trigger offset, minus the initial move_to.
        assert_eq!(trace_len, 1024 - SampleWindow::triggered(&data).trigger_index - 1);
    }

    #[test]
    fn degenerate_sec_div_draws_grid_only() {
        let data = sine_window();
        let window = SampleWindow::triggered(&data);
        for sec_div in [1e-6, 0.0, -0.5, f64::NAN] {
            let mut renderer = recorder_renderer(640.0, 320.0);
            renderer.set_scaling(sec_div, 1.0);
            assert!(renderer.trace_geometry().is_none());
            renderer.draw(&window);
            assert_eq!(
                renderer.surface().stroke_count(),
                GRID_STROKES + 1,
                "sec/div {sec_div}"
            );
        }
    }

    #[test]
    fn degenerate_volt_div_draws_grid_only() {
        let data = sine_window();
        let mut renderer = recorder_renderer(640.0, 320.0);
        renderer.update_config(Scaling::new(0.01, 0.0));
        renderer.draw(&SampleWindow::triggered(&data));
        assert_eq!(renderer.surface().stroke_count(), GRID_STROKES + 1);
    }

    #[test]
    fn paints_raster_surface() {
        let mut renderer = ScopeRenderer::new(RasterSurface::new(200, 80), None);
        renderer.set_scaling(0.0005, 1.0);
        let data = [255u8; 64];
        renderer.draw(&SampleWindow::new(&data, 0));

        let surface = renderer.into_surface();
        let bg = theme::oscilloscope::BACKGROUND;
        let trace = theme::oscilloscope::TRACE.color;
        let axis = theme::oscilloscope::AXIS.color;
        // 255 sits just under the first division above centre.
        assert_eq!(surface.pixel(15, 30), Some(trace));
        assert_eq!(surface.pixel(15, 40), Some(axis));
        assert_eq!(surface.pixel(15, 65), Some(bg));
    }
}
