//! Annotation Renderer
//!
//! Holds the annotation set of the current run and draws the subset that is
//! active at a playback time onto a render target. The same matching logic
//! feeds both the composited canvas and the DOM overlay.

mod canvas;
mod overlay;
mod recording;

pub use canvas::{Canvas2d, CanvasTarget, PixelPoint, Stroke, TextAlign, TextStyle};
pub use overlay::{OverlayElement, OverlayLayer};
pub use recording::{DrawCommand, RecordingCanvas};

use std::sync::{Arc, RwLock};

use crate::core::annotations::Annotation;
use crate::core::TimeSec;

/// Surface annotations are drawn onto.
pub trait RenderTarget {
    /// Resets the surface: clear and redraw the video frame, or empty the overlay.
    fn begin_frame(&mut self);

    fn draw_annotation(&mut self, annotation: &Annotation);
}

/// Time-indexed annotation renderer.
#[derive(Debug)]
pub struct AnnotationRenderer {
    annotations: RwLock<Arc<[Annotation]>>,
}

impl Default for AnnotationRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationRenderer {
    pub fn new() -> Self {
        Self {
            annotations: RwLock::new(Arc::from(Vec::new())),
        }
    }

    /// Atomically replaces the annotation set.
    pub fn set_annotations(&self, annotations: impl Into<Vec<Annotation>>) {
        let next: Arc<[Annotation]> = annotations.into().into();
        let mut current = self.annotations.write().unwrap_or_else(|e| e.into_inner());
        *current = next;
    }

    /// Current annotation set.
    pub fn snapshot(&self) -> Arc<[Annotation]> {
        self.annotations
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Annotations whose anchor is within the match window of `t`.
    pub fn active_at(&self, t: TimeSec) -> Vec<Annotation> {
        self.snapshot()
            .iter()
            .filter(|a| a.is_active_at(t))
            .cloned()
            .collect()
    }

    /// Resets `target` and draws every annotation active at `t`.
    ///
    /// Returns how many annotations were drawn.
    pub fn render<T>(&self, target: &mut T, t: TimeSec) -> usize
    where
        T: RenderTarget + ?Sized,
    {
        let set = self.snapshot();
        target.begin_frame();

        let mut drawn = 0;
        for annotation in set.iter().filter(|a| a.is_active_at(t)) {
            target.draw_annotation(annotation);
            drawn += 1;
        }
        drawn
    }
}
