//! Drawing surface abstraction and the recording surface

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::palette::Color;
use crate::sim::Rect;

/// Horizontal text anchoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

/// Font size, color and anchoring for a text draw
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub size: f32,
    pub color: Color,
    pub align: TextAlign,
}

impl TextStyle {
    pub const fn new(size: f32, color: Color, align: TextAlign) -> Self {
        Self { size, color, align }
    }
}

/// A 2D target games paint onto
pub trait Surface {
    /// Drawable area in surface units
    fn size(&self) -> Vec2;
    fn clear(&mut self, color: Color);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn fill_text(&mut self, text: &str, pos: Vec2, style: TextStyle);
    /// Called by the frame loop before each frame is painted
    fn begin_frame(&mut self) {}
}

/// One recorded draw call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PaintCommand {
    Clear { color: Color },
    FillRect { rect: Rect, color: Color },
    Text { text: String, pos: Vec2, style: TextStyle },
}

/// Surface that records paint commands instead of drawing
#[derive(Debug, Clone, Default)]
pub struct PaintList {
    size: Vec2,
    commands: Vec<PaintCommand>,
}

impl PaintList {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[PaintCommand] {
        &self.commands
    }

    /// Drop recorded commands, keeping the size
    pub fn reset(&mut self) {
        self.commands.clear();
    }

    /// All text drawn so far, in order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            PaintCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Whether any text command contains `needle`
    pub fn has_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }

    /// Rectangles filled with `color`
    pub fn rects_with(&self, color: Color) -> Vec<Rect> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                PaintCommand::FillRect { rect, color: c } if *c == color => Some(*rect),
                _ => None,
            })
            .collect()
    }
}

impl Surface for PaintList {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn clear(&mut self, color: Color) {
        self.commands.push(PaintCommand::Clear { color });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(PaintCommand::FillRect { rect, color });
    }

    fn fill_text(&mut self, text: &str, pos: Vec2, style: TextStyle) {
        self.commands.push(PaintCommand::Text {
            text: text.to_owned(),
            pos,
            style,
        });
    }

    /// Keep only the latest frame
    fn begin_frame(&mut self) {
        self.reset();
    }
}
