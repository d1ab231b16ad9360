//! Recording canvas
//!
//! A [`Canvas2d`] that records draw calls as serializable commands, so a
//! frontend can replay them and tests can compare them.

use serde::Serialize;

use super::canvas::{Canvas2d, PixelPoint, Stroke, TextStyle};

/// Average glyph width as a fraction of the font size.
const GLYPH_WIDTH_RATIO: f64 = 0.6;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawCommand {
    Clear,
    VideoFrame,
    Line {
        from: PixelPoint,
        to: PixelPoint,
        stroke: Stroke,
    },
    Polygon {
        points: Vec<PixelPoint>,
        color: &'static str,
    },
    Circle {
        center: PixelPoint,
        radius: f64,
        stroke: Stroke,
    },
    Rect {
        origin: PixelPoint,
        width: f64,
        height: f64,
        color: &'static str,
    },
    Text {
        text: String,
        at: PixelPoint,
        style: TextStyle,
    },
}

/// Canvas that keeps the commands of the latest frame.
#[derive(Clone, Debug)]
pub struct RecordingCanvas {
    width: f64,
    height: f64,
    commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    /// Changes the surface size; the next render recomputes positions.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl Canvas2d for RecordingCanvas {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn clear(&mut self) {
        // Clearing the surface starts a new frame.
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
    }

    fn draw_video_frame(&mut self) {
        self.commands.push(DrawCommand::VideoFrame);
    }

    fn stroke_line(&mut self, from: PixelPoint, to: PixelPoint, stroke: &Stroke) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            stroke: stroke.clone(),
        });
    }

    fn fill_polygon(&mut self, points: &[PixelPoint], color: &'static str) {
        self.commands.push(DrawCommand::Polygon {
            points: points.to_vec(),
            color,
        });
    }

    fn stroke_circle(&mut self, center: PixelPoint, radius: f64, stroke: &Stroke) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            stroke: stroke.clone(),
        });
    }

    fn fill_rect(&mut self, origin: PixelPoint, width: f64, height: f64, color: &'static str) {
        self.commands.push(DrawCommand::Rect {
            origin,
            width,
            height,
            color,
        });
    }

    fn draw_text(&mut self, text: &str, at: PixelPoint, style: &TextStyle) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            at,
            style: style.clone(),
        });
    }

    fn measure_text(&self, text: &str, style: &TextStyle) -> f64 {
        text.chars().count() as f64 * style.font_px * GLYPH_WIDTH_RATIO
    }
}
