//! Response Parser
//!
//! Turns raw provider text into a [`FrameAnalysis`]. Decoding is strict about
//! the enums that drive scoring and lenient about everything else; [`parse`]
//! never fails and falls back to [`FrameAnalysis::fallback`].
//!
//! [`parse`]: ResponseParser::parse

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::{FrameAnalysis, Rating, SurfAction, SurferPosition};
use crate::core::annotations::{Annotation, AnnotationKind, DEFAULT_DISPLAY_SECS};
use crate::core::{AnnotationPoint, CoreError, CoreResult, TimeSec};

// =============================================================================
// Wire Shape
// =============================================================================

#[derive(Deserialize)]
struct RawAnalysis {
    #[serde(alias = "surferPosition", alias = "position")]
    surfer_position: Option<String>,
    #[serde(alias = "bodyPosture", alias = "posture")]
    body_posture: Option<String>,
    #[serde(alias = "waveCondition")]
    wave_condition: Option<String>,
    #[serde(alias = "currentAction", alias = "action")]
    current_action: Option<String>,
    #[serde(alias = "actionQuality")]
    action_quality: Option<String>,
    timing: Option<String>,
    suggestions: Option<serde_json::Value>,
    annotations: Option<Vec<serde_json::Value>>,
}

#[derive(Deserialize)]
struct RawAnnotation {
    #[serde(rename = "type", alias = "kind")]
    kind: String,
    position: RawPoint,
    #[serde(default)]
    style: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Deserialize)]
struct RawPoint {
    x: f64,
    y: f64,
}

// =============================================================================
// Parser
// =============================================================================

/// Markdown code fence around a JSON object.
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").expect("valid regex")
});

/// Decoder for provider replies.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResponseParser;

impl ResponseParser {
    pub fn new() -> Self {
        Self
    }

    /// Decodes a reply, returning the fallback analysis on any failure.
    pub fn parse(&self, raw: &str, timestamp: TimeSec) -> FrameAnalysis {
        match self.try_parse(raw, timestamp) {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!("Using fallback analysis at {:.2}s: {}", timestamp, e);
                FrameAnalysis::fallback(timestamp)
            }
        }
    }

    /// Decodes a reply, reporting why it does not match the schema.
    pub fn try_parse(&self, raw: &str, timestamp: TimeSec) -> CoreResult<FrameAnalysis> {
        let json = self
            .extract_json(raw)
            .ok_or_else(|| CoreError::Parse("No JSON object found in response".to_string()))?;

        let raw: RawAnalysis = serde_json::from_str(json)
            .map_err(|e| CoreError::Parse(format!("Response does not match schema: {}", e)))?;

        let surfer_position = required(raw.surfer_position.as_deref(), "surfer_position")
            .and_then(|v| {
                SurferPosition::from_label(v)
                    .ok_or_else(|| CoreError::Parse(format!("Unrecognized surfer_position: {}", v)))
            })?;
        let body_posture = parse_rating(raw.body_posture.as_deref(), "body_posture")?;
        let action_quality = parse_rating(raw.action_quality.as_deref(), "action_quality")?;
        let current_action = raw
            .current_action
            .as_deref()
            .map(SurfAction::from_label)
            .unwrap_or(SurfAction::Unknown);

        let wave_condition = raw
            .wave_condition
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .unwrap_or_else(|| "unspecified".to_string());

        let annotations = raw
            .annotations
            .unwrap_or_default()
            .into_iter()
            .filter_map(|value| decode_annotation(value, timestamp))
            .collect();

        Ok(FrameAnalysis {
            timestamp,
            surfer_position,
            body_posture,
            wave_condition,
            current_action,
            action_quality,
            timing: raw.timing.map(|t| t.trim().to_string()).unwrap_or_default(),
            suggestions: decode_suggestions(raw.suggestions),
            annotations,
        })
    }

    /// Finds the JSON object in a reply: bare, fenced, or embedded in prose.
    fn extract_json<'a>(&self, raw: &'a str) -> Option<&'a str> {
        let trimmed = raw.trim();
        if trimmed.starts_with('{') && trimmed.ends_with('}') {
            return Some(trimmed);
        }
        if let Some(m) = FENCED_BLOCK.captures(trimmed).and_then(|c| c.get(1)) {
            return Some(m.as_str());
        }
        let start = trimmed.find('{')?;
        let end = trimmed.rfind('}')?;
        (end > start).then(|| &trimmed[start..=end])
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> CoreResult<&'a str> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| CoreError::Parse(format!("Missing field: {}", field)))
}

/// Off-tier labels are kept as `Rating::Other`; only a missing value fails.
fn parse_rating(value: Option<&str>, field: &str) -> CoreResult<Rating> {
    let value = required(value, field)?;
    Ok(Rating::from_label(value).unwrap_or_else(|| Rating::Other(value.trim().to_string())))
}

/// Accepts a list of strings or a single string.
fn decode_suggestions(value: Option<serde_json::Value>) -> Vec<String> {
    let items = match value {
        Some(serde_json::Value::Array(items)) => items,
        Some(serde_json::Value::String(s)) => vec![serde_json::Value::String(s)],
        _ => Vec::new(),
    };
    items
        .into_iter()
        .filter_map(|v| v.as_str().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Decodes one provider annotation, anchored to the frame. Malformed entries
/// are dropped individually.
fn decode_annotation(value: serde_json::Value, timestamp: TimeSec) -> Option<Annotation> {
    let raw: RawAnnotation = match serde_json::from_value(value) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!("Dropping malformed annotation: {}", e);
            return None;
        }
    };
    let Some(kind) = AnnotationKind::from_label(&raw.kind) else {
        tracing::debug!("Dropping annotation of unknown type: {}", raw.kind);
        return None;
    };

    let mut annotation = Annotation::new(
        kind,
        AnnotationPoint::new(raw.position.x, raw.position.y),
        raw.style.unwrap_or_else(|| kind.as_str().to_string()),
        raw.text.unwrap_or_default(),
        timestamp,
    )
    .with_description(raw.description.unwrap_or_default());
    annotation.duration = raw
        .duration
        .filter(|d| d.is_finite() && *d > 0.0)
        .unwrap_or(DEFAULT_DISPLAY_SECS);
    Some(annotation)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
        "surfer_position": "face",
        "body_posture": "needs-improvement",
        "wave_condition": "steep and fast",
        "current_action": "bottom turn",
        "action_quality": "excellent",
        "timing": "slightly delayed",
        "suggestions": ["Bend your knees", "Look down the line"]
    }"#;

    // -------------------------------------------------------------------------
    // Successful decoding
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_full_response() {
        let parser = ResponseParser::new();
        let a = parser.try_parse(FULL, 4.0).unwrap();
        assert_eq!(a.timestamp, 4.0);
        assert_eq!(a.surfer_position, SurferPosition::Face);
        assert_eq!(a.body_posture, Rating::NeedsImprovement);
        assert_eq!(a.current_action, SurfAction::Turn);
        assert_eq!(a.action_quality, Rating::Excellent);
        assert_eq!(a.timing, "slightly delayed");
        assert_eq!(a.suggestions, vec!["Bend your knees", "Look down the line"]);
        assert!(a.annotations.is_empty());
    }

    #[test]
    fn test_parse_fenced_and_prose_wrapped() {
        let parser = ResponseParser::new();
        let fenced = format!("Here is the analysis:\n```json\n{}\n```\nHope it helps", FULL);
        assert_eq!(parser.try_parse(&fenced, 0.0).unwrap().current_action, SurfAction::Turn);

        let prose = format!("Sure! {} Let me know.", FULL);
        assert_eq!(parser.try_parse(&prose, 0.0).unwrap().body_posture, Rating::NeedsImprovement);
    }

    #[test]
    fn test_parse_camel_case_and_chinese_labels() {
        let raw = r#"{"surferPosition":"浪峰","bodyPosture":"优秀","currentAction":"回切",
                      "actionQuality":"良好","timing":"准确","suggestions":"保持速度"}"#;
        let a = ResponseParser::new().try_parse(raw, 1.0).unwrap();
        assert_eq!(a.surfer_position, SurferPosition::Crest);
        assert_eq!(a.body_posture, Rating::Excellent);
        assert_eq!(a.current_action, SurfAction::Cutback);
        assert_eq!(a.action_quality, Rating::Good);
        assert_eq!(a.wave_condition, "unspecified");
        assert_eq!(a.suggestions, vec!["保持速度"]);
    }

    #[test]
    fn test_unknown_action_is_not_a_failure() {
        let raw = r#"{"surfer_position":"trough","body_posture":"good",
                      "current_action":"paddling out","action_quality":"good"}"#;
        let a = ResponseParser::new().try_parse(raw, 0.0).unwrap();
        assert_eq!(a.current_action, SurfAction::Unknown);
        assert_eq!(a.timing, "");
    }

    #[test]
    fn test_off_tier_ratings_are_kept() {
        let raw = r#"{"surfer_position":"face","body_posture":"average",
            "current_action":"bottom turn","action_quality":"fair",
            "timing":"a bit rushed","suggestions":["Compress more"]}"#;
        let a = ResponseParser::new().try_parse(raw, 2.0).unwrap();
        assert_eq!(a.current_action, SurfAction::Turn);
        assert_eq!(a.body_posture, Rating::Other("average".to_string()));
        assert_eq!(a.action_quality, Rating::Other("fair".to_string()));
        assert_eq!(a.suggestions, vec!["Compress more"]);

        let raw = r#"{"surfer_position":"face","body_posture":"not great",
            "current_action":"glide","action_quality":"good"}"#;
        let a = ResponseParser::new().try_parse(raw, 0.0).unwrap();
        assert_eq!(a.body_posture, Rating::Other("not great".to_string()));
    }

    // -------------------------------------------------------------------------
    // Annotations
    // -------------------------------------------------------------------------

    #[test]
    fn test_explicit_annotations_are_clamped_and_anchored() {
        let raw = r#"{"surfer_position":"face","body_posture":"good","current_action":"glide",
            "action_quality":"good","timing":"good","suggestions":[],
            "annotations":[
                {"type":"circle","position":{"x":130,"y":-4},"style":"balance-circle",
                 "text":"knees"},
                {"type":"hexagon","position":{"x":1,"y":1},"text":"dropped"},
                {"type":"arrow","text":"no position"}
            ]}"#;
        let a = ResponseParser::new().try_parse(raw, 8.0).unwrap();
        assert_eq!(a.annotations.len(), 1);
        let ann = &a.annotations[0];
        assert_eq!(ann.kind, AnnotationKind::Circle);
        assert_eq!(ann.position, AnnotationPoint { x: 100.0, y: 0.0 });
        assert_eq!(ann.timestamp, 8.0);
        assert_eq!(ann.duration, DEFAULT_DISPLAY_SECS);
        assert_eq!(ann.text, "knees");
    }

    // -------------------------------------------------------------------------
    // Failures and fallback
    // -------------------------------------------------------------------------

    #[test]
    fn test_try_parse_failures() {
        let parser = ResponseParser::new();
        for raw in [
            "I cannot analyze this image.",
            "{not json}",
            r#"{"body_posture":"good","action_quality":"good"}"#,
            r#"{"surfer_position":"airborne","body_posture":"good","action_quality":"good"}"#,
            r#"{"surfer_position":"face","body_posture":"  ","action_quality":"good"}"#,
        ] {
            let err = parser.try_parse(raw, 0.0).unwrap_err();
            assert!(matches!(err, CoreError::Parse(_)), "{}", raw);
        }
    }

    #[test]
    fn test_parse_returns_fallback() {
        let parser = ResponseParser::new();
        assert_eq!(parser.parse("garbage", 6.0), FrameAnalysis::fallback(6.0));
    }
}
