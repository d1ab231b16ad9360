//! Canvas target
//!
//! Draws annotations with pixel primitives on a 2D drawing context that also
//! shows the video frame underneath.

use serde::Serialize;

use super::RenderTarget;
use crate::core::annotations::{styles, Annotation, AnnotationKind};

// =============================================================================
// Drawing Context
// =============================================================================

/// Pixel position on the surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub color: &'static str,
    pub width: f64,
    /// `[dash, gap]` in pixels, solid when `None`
    pub dash: Option<[f64; 2]>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font_px: f64,
    pub bold: bool,
    pub color: &'static str,
    pub outline: Option<&'static str>,
    pub align: TextAlign,
}

/// Minimal 2D drawing context, modelled on an HTML canvas.
pub trait Canvas2d {
    fn width(&self) -> f64;
    fn height(&self) -> f64;
    fn clear(&mut self);
    /// Redraws the current video frame over the whole surface.
    fn draw_video_frame(&mut self);
    fn stroke_line(&mut self, from: PixelPoint, to: PixelPoint, stroke: &Stroke);
    fn fill_polygon(&mut self, points: &[PixelPoint], color: &'static str);
    fn stroke_circle(&mut self, center: PixelPoint, radius: f64, stroke: &Stroke);
    fn fill_rect(&mut self, origin: PixelPoint, width: f64, height: f64, color: &'static str);
    fn draw_text(&mut self, text: &str, at: PixelPoint, style: &TextStyle);
    fn measure_text(&self, text: &str, style: &TextStyle) -> f64;
}

// =============================================================================
// Draw Constants
// =============================================================================

const LINE_STROKE: Stroke = Stroke {
    color: "#ffffff",
    width: 3.0,
    dash: Some([10.0, 5.0]),
};
const ARROW_STROKE: Stroke = Stroke {
    color: "#00ff00",
    width: 3.0,
    dash: None,
};
const CIRCLE_STROKE: Stroke = Stroke {
    color: "#ff0000",
    width: 3.0,
    dash: None,
};
const LABEL_STYLE: TextStyle = TextStyle {
    font_px: 18.0,
    bold: true,
    color: "#ffffff",
    outline: Some("#000000"),
    align: TextAlign::Center,
};
const DESCRIPTION_STYLE: TextStyle = TextStyle {
    font_px: 14.0,
    bold: false,
    color: "#ffffff",
    outline: None,
    align: TextAlign::Left,
};
const DESCRIPTION_BACKGROUND: &str = "rgba(0, 0, 0, 0.7)";

/// Offsets in percent of the surface.
const GENERIC_LINE_OFFSET: f64 = 20.0;
const SPEED_LINE_LENGTH: f64 = 30.0;
const SPEED_ZONE_SPACING: f64 = 15.0;
const SPEED_ZONES: usize = 3;
const ARROW_OFFSET: f64 = 25.0;
const DESCRIPTION_OFFSET: (f64, f64) = (5.0, 25.0);

/// Sizes in pixels.
const ARROW_HEAD_LENGTH: f64 = 15.0;
const ARROW_HEAD_ANGLE: f64 = std::f64::consts::PI / 6.0;
const CIRCLE_RADIUS: f64 = 20.0;
const DESCRIPTION_PADDING: f64 = 5.0;
const DESCRIPTION_BOX_HEIGHT: f64 = 20.0;
const DESCRIPTION_BASELINE: f64 = 15.0;

// =============================================================================
// Canvas Target
// =============================================================================

/// Composited video + overlay canvas.
pub struct CanvasTarget<C: Canvas2d> {
    canvas: C,
}

impl<C: Canvas2d> CanvasTarget<C> {
    pub fn new(canvas: C) -> Self {
        Self { canvas }
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }

    pub fn into_inner(self) -> C {
        self.canvas
    }

    /// Percent coordinates to pixels at the surface's current size.
    fn px(&self, x_pct: f64, y_pct: f64) -> PixelPoint {
        PixelPoint::new(
            x_pct / 100.0 * self.canvas.width(),
            y_pct / 100.0 * self.canvas.height(),
        )
    }

    fn draw_line(&mut self, a: &Annotation) {
        let (x, y) = (a.position.x, a.position.y);
        if a.has_style(styles::SPEED_LINE) {
            // Fastest zone nearest the anchor, thinner strokes further down.
            for zone in 0..SPEED_ZONES {
                let zy = y + zone as f64 * SPEED_ZONE_SPACING;
                let stroke = Stroke {
                    width: LINE_STROKE.width - zone as f64,
                    ..LINE_STROKE
                };
                let from = self.px(x, zy);
                let to = self.px(x + SPEED_LINE_LENGTH, zy);
                self.canvas.stroke_line(from, to, &stroke);
            }
        } else {
            let from = self.px(x, y);
            let to = self.px(x + GENERIC_LINE_OFFSET, y + GENERIC_LINE_OFFSET);
            self.canvas.stroke_line(from, to, &LINE_STROKE);
        }
    }

    fn draw_arrow(&mut self, a: &Annotation) {
        let start = self.px(a.position.x, a.position.y);
        let end = self.px(a.position.x + ARROW_OFFSET, a.position.y + ARROW_OFFSET);
        self.canvas.stroke_line(start, end, &ARROW_STROKE);

        let angle = (end.y - start.y).atan2(end.x - start.x);
        let head = [
            end,
            PixelPoint::new(
                end.x - ARROW_HEAD_LENGTH * (angle - ARROW_HEAD_ANGLE).cos(),
                end.y - ARROW_HEAD_LENGTH * (angle - ARROW_HEAD_ANGLE).sin(),
            ),
            PixelPoint::new(
                end.x - ARROW_HEAD_LENGTH * (angle + ARROW_HEAD_ANGLE).cos(),
                end.y - ARROW_HEAD_LENGTH * (angle + ARROW_HEAD_ANGLE).sin(),
            ),
        ];
        self.canvas.fill_polygon(&head, ARROW_STROKE.color);
    }

    fn draw_description(&mut self, a: &Annotation, description: &str) {
        let at = self.px(
            a.position.x + DESCRIPTION_OFFSET.0,
            a.position.y + DESCRIPTION_OFFSET.1,
        );
        let text_width = self.canvas.measure_text(description, &DESCRIPTION_STYLE);
        self.canvas.fill_rect(
            PixelPoint::new(at.x - DESCRIPTION_PADDING, at.y - DESCRIPTION_BASELINE),
            text_width + DESCRIPTION_PADDING * 2.0,
            DESCRIPTION_BOX_HEIGHT,
            DESCRIPTION_BACKGROUND,
        );
        self.canvas.draw_text(description, at, &DESCRIPTION_STYLE);
    }
}

impl<C: Canvas2d> RenderTarget for CanvasTarget<C> {
    fn begin_frame(&mut self) {
        self.canvas.clear();
        self.canvas.draw_video_frame();
    }

    fn draw_annotation(&mut self, annotation: &Annotation) {
        match annotation.kind {
            AnnotationKind::Line => self.draw_line(annotation),
            AnnotationKind::Text => {
                let at = self.px(annotation.position.x, annotation.position.y);
                self.canvas.draw_text(&annotation.text, at, &LABEL_STYLE);
            }
            AnnotationKind::Arrow => self.draw_arrow(annotation),
            AnnotationKind::Circle => {
                let center = self.px(annotation.position.x, annotation.position.y);
                self.canvas.stroke_circle(center, CIRCLE_RADIUS, &CIRCLE_STROKE);
            }
        }

        if let Some(description) = annotation.description.as_deref() {
            self.draw_description(annotation, description);
        }
    }
}
