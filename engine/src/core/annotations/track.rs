//! Annotation Track
//!
//! The accumulated annotations of a run, with time lookup.

use serde::{Deserialize, Serialize};

use super::Annotation;
use crate::core::analysis::FrameAnalysis;
use crate::core::TimeSec;

/// Ordered annotation collection for one run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationTrack {
    items: Vec<Annotation>,
}

impl AnnotationTrack {
    pub fn new(items: Vec<Annotation>) -> Self {
        Self { items }
    }

    /// Concatenates every frame's annotations in frame order.
    pub fn from_frames(frames: &[FrameAnalysis]) -> Self {
        Self {
            items: frames
                .iter()
                .flat_map(|f| f.annotations.iter().cloned())
                .collect(),
        }
    }

    /// Annotations to draw at `t`. Overlapping matches are all returned.
    pub fn active_at(&self, t: TimeSec) -> impl Iterator<Item = &Annotation> {
        self.items.iter().filter(move |a| a.is_active_at(t))
    }

    /// Stable chronological order for report display.
    pub fn chronological(&self) -> Vec<&Annotation> {
        let mut sorted: Vec<&Annotation> = self.items.iter().collect();
        sorted.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        sorted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Annotation> {
        self.items
    }
}

impl From<Vec<Annotation>> for AnnotationTrack {
    fn from(items: Vec<Annotation>) -> Self {
        Self::new(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::annotations::AnnotationKind;
    use crate::core::AnnotationPoint;

    fn at(t: f64, label: &str) -> Annotation {
        Annotation::new(
            AnnotationKind::Text,
            AnnotationPoint::new(10.0, 10.0),
            "note",
            label,
            t,
        )
    }

    #[test]
    fn test_active_at_keeps_overlaps() {
        let track = AnnotationTrack::new(vec![at(2.0, "a"), at(2.3, "b"), at(4.0, "c")]);
        let labels: Vec<&str> = track.active_at(2.2).map(|a| a.text.as_str()).collect();
        assert_eq!(labels, vec!["a", "b"]);
        assert_eq!(track.active_at(3.0).count(), 0);
    }

    #[test]
    fn test_chronological_is_stable() {
        let track = AnnotationTrack::new(vec![at(4.0, "late"), at(0.0, "x"), at(0.0, "y")]);
        let labels: Vec<&str> = track.chronological().iter().map(|a| a.text.as_str()).collect();
        assert_eq!(labels, vec!["x", "y", "late"]);
    }

    #[test]
    fn test_from_frames() {
        let mut f0 = FrameAnalysis::fallback(0.0);
        f0.annotations = vec![at(0.0, "a")];
        let mut f1 = FrameAnalysis::fallback(2.0);
        f1.annotations = vec![at(2.0, "b"), at(2.0, "c")];
        let track = AnnotationTrack::from_frames(&[f0, f1]);
        assert_eq!(track.len(), 3);
    }
}
