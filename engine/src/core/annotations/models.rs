//! Annotation Models
//!
//! Time-anchored coaching markers placed in percent-of-surface coordinates.

use serde::{Deserialize, Serialize};

use crate::core::{AnnotationPoint, TimeSec};

/// How long an annotation stays on screen by default.
pub const DEFAULT_DISPLAY_SECS: f64 = 3.0;

/// Half-width of the playback window in which an annotation is drawn.
pub const MATCH_TOLERANCE_SECS: f64 = 0.5;

/// Well-known style tags.
pub mod styles {
    pub const SPEED_LINE: &str = "speed-line";
    pub const ACTION_ARROW: &str = "action-arrow";
    pub const BALANCE_CIRCLE: &str = "balance-circle";
}

/// Draw primitive of an annotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Line,
    Text,
    Arrow,
    Circle,
}

impl AnnotationKind {
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "line" => Some(Self::Line),
            "text" | "label" => Some(Self::Text),
            "arrow" => Some(Self::Arrow),
            "circle" => Some(Self::Circle),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Text => "text",
            Self::Arrow => "arrow",
            Self::Circle => "circle",
        }
    }
}

/// Immutable coaching marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: AnnotationKind,
    pub position: AnnotationPoint,
    /// Free-form style tag, selects the draw variant
    pub style: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub timestamp: TimeSec,
    #[serde(default = "default_duration")]
    pub duration: f64,
}

fn default_duration() -> f64 {
    DEFAULT_DISPLAY_SECS
}

impl Annotation {
    pub fn new(
        kind: AnnotationKind,
        position: AnnotationPoint,
        style: impl Into<String>,
        text: impl Into<String>,
        timestamp: TimeSec,
    ) -> Self {
        Self {
            kind,
            position,
            style: style.into(),
            text: text.into(),
            description: None,
            timestamp,
            duration: DEFAULT_DISPLAY_SECS,
        }
    }

    /// Sets the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = if description.trim().is_empty() {
            None
        } else {
            Some(description)
        };
        self
    }

    /// Whether this annotation should be drawn at playback time `t`.
    pub fn is_active_at(&self, t: TimeSec) -> bool {
        (self.timestamp - t).abs() < MATCH_TOLERANCE_SECS
    }

    pub fn has_style(&self, style: &str) -> bool {
        self.style == style
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_window_is_open_interval() {
        let a = Annotation::new(
            AnnotationKind::Circle,
            AnnotationPoint::new(10.0, 10.0),
            "x",
            "x",
            4.0,
        );
        assert!(a.is_active_at(4.0));
        assert!(a.is_active_at(4.49));
        assert!(a.is_active_at(3.51));
        assert!(!a.is_active_at(4.5));
        assert!(!a.is_active_at(3.5));
    }

    #[test]
    fn test_serde_uses_type_key_and_default_duration() {
        let json = r#"{"type":"arrow","position":{"x":50,"y":50},"style":"action-arrow",
            "text":"turn","timestamp":2.0}"#;
        let a: Annotation = serde_json::from_str(json).unwrap();
        assert_eq!(a.kind, AnnotationKind::Arrow);
        assert_eq!(a.duration, DEFAULT_DISPLAY_SECS);
        assert!(a.description.is_none());

        let back = serde_json::to_value(&a).unwrap();
        assert_eq!(back["type"], "arrow");
        assert!(back.get("description").is_none());
    }

    #[test]
    fn test_blank_description_is_dropped() {
        let a = Annotation::new(
            AnnotationKind::Text,
            AnnotationPoint::new(0.0, 0.0),
            "note",
            "hi",
            0.0,
        )
        .with_description("  ");
        assert!(a.description.is_none());
    }
}
