//! Surface that records drawing commands instead of painting.

use super::common::{Color, Point, Rect, Size, StrokeStyle, Surface};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear,
    FillRect { rect: Rect, color: Color },
    SetStroke { style: StrokeStyle },
    BeginPath,
    MoveTo { point: Point },
    LineTo { point: Point },
    Stroke,
}

#[derive(Debug, Clone)]
pub struct CommandRecorder {
    size: Size,
    commands: Vec<DrawCommand>,
}

impl CommandRecorder {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Size::new(width, height),
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Number of `stroke` commands issued so far.
    pub fn stroke_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Stroke))
            .count()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.commands)
    }
}

impl Surface for CommandRecorder {
    fn size(&self) -> Size {
        self.size
    }
    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }
    fn set_stroke(&mut self, style: StrokeStyle) {
        self.commands.push(DrawCommand::SetStroke { style });
    }
    fn begin_path(&mut self) {
        self.commands.push(DrawCommand::BeginPath);
    }
    fn move_to(&mut self, point: Point) {
        self.commands.push(DrawCommand::MoveTo { point });
    }
    fn line_to(&mut self, point: Point) {
        self.commands.push(DrawCommand::LineTo { point });
    }
    fn stroke(&mut self) {
        self.commands.push(DrawCommand::Stroke);
    }
}
