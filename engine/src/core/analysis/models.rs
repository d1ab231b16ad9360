//! Analysis Models
//!
//! Frame samples going out to providers and the structured per-frame result
//! coming back.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::core::annotations::Annotation;
use crate::core::TimeSec;

// =============================================================================
// Frame Sample
// =============================================================================

/// Encoded still image captured from the video.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl EncodedImage {
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: "image/jpeg".to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    /// `data:<mime>;base64,<payload>` form used by OpenAI-style image inputs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

/// One sampled frame. Dropped once its provider call returns.
#[derive(Clone, Debug)]
pub struct FrameSample {
    pub timestamp: TimeSec,
    pub image: EncodedImage,
    /// Zero-based position in the run
    pub index: usize,
    pub total: usize,
}

impl FrameSample {
    /// Fraction of the run this frame sits at, in `[0, 1)`.
    pub fn run_fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.index as f64 / self.total as f64
        }
    }
}

// =============================================================================
// Enumerations
// =============================================================================

/// Where the surfer sits on the wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurferPosition {
    Crest,
    Face,
    Trough,
}

impl SurferPosition {
    /// Maps a free-form label, including the Chinese labels some models echo
    /// back from the prompt template.
    pub fn from_label(label: &str) -> Option<Self> {
        let l = label.trim().to_lowercase();
        if l.is_empty() {
            return None;
        }
        let any = |words: &[&str]| words.iter().any(|w| l.contains(w));
        if any(&["crest", "peak", "lip", "浪峰"]) {
            Some(Self::Crest)
        } else if any(&["face", "wall", "shoulder", "浪壁"]) {
            Some(Self::Face)
        } else if any(&["trough", "bottom", "flat", "浪底"]) {
            Some(Self::Trough)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crest => "crest",
            Self::Face => "face",
            Self::Trough => "trough",
        }
    }
}

/// Quality rating used for posture and action quality.
///
/// The three known tiers plus any other label the provider chose, kept
/// verbatim so it still counts toward the report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Rating {
    Excellent,
    Good,
    NeedsImprovement,
    Other(String),
}

/// Score of a label outside the three tiers.
pub const OTHER_RATING_SCORE: f64 = 6.0;

impl Rating {
    /// Maps a free-form label onto a tier. Negated phrases ("not great") and
    /// unknown words become [`Rating::Other`]; blank labels map to `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        let l = label.trim().to_lowercase().replace(['_', '-'], " ");
        if l.is_empty() {
            return None;
        }
        let negated = l
            .split_whitespace()
            .any(|w| matches!(w, "not" | "never" | "isn't" | "wasn't"));

        let rating = if l.contains("need")
            || l.contains("improve")
            || l.contains("poor")
            || l.contains("需改进")
        {
            Self::NeedsImprovement
        } else if negated {
            Self::Other(label.trim().to_string())
        } else if l.contains("excellent")
            || l.contains("great")
            || l.contains("optimal")
            || l.contains("优秀")
        {
            Self::Excellent
        } else if l.contains("good")
            || l.contains("fine")
            || l.split_whitespace().any(|w| w == "ok")
            || l.contains("良好")
        {
            Self::Good
        } else {
            Self::Other(label.trim().to_string())
        };
        Some(rating)
    }

    /// Tier score: excellent 9, good 7, needs-improvement 5, anything else 6.
    pub fn score(&self) -> f64 {
        match self {
            Self::Excellent => 9.0,
            Self::Good => 7.0,
            Self::NeedsImprovement => 5.0,
            Self::Other(_) => OTHER_RATING_SCORE,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::NeedsImprovement => "needs-improvement",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for Rating {
    fn from(label: String) -> Self {
        Self::from_label(&label).unwrap_or(Self::Other(label))
    }
}

impl From<Rating> for String {
    fn from(rating: Rating) -> Self {
        match rating {
            Rating::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

/// Fixed surf maneuver vocabulary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurfAction {
    Takeoff,
    Glide,
    Turn,
    Cutback,
    Accelerate,
    Decelerate,
    Unknown,
}

impl SurfAction {
    /// Maps a label onto the vocabulary; anything unrecognised is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        let l = label.trim().to_lowercase();
        let any = |words: &[&str]| words.iter().any(|w| l.contains(w));
        if any(&["take", "pop", "起乘"]) {
            Self::Takeoff
        } else if any(&["cutback", "cut back", "回切"]) {
            Self::Cutback
        } else if any(&["turn", "carve", "转向"]) {
            Self::Turn
        } else if any(&["decel", "slow", "stall", "减速"]) {
            Self::Decelerate
        } else if any(&["accel", "pump", "speed", "加速"]) {
            Self::Accelerate
        } else if any(&["glid", "trim", "cruis", "滑行"]) {
            Self::Glide
        } else {
            Self::Unknown
        }
    }

    pub fn is_known(&self) -> bool {
        *self != Self::Unknown
    }

    /// Actions reported as key moments.
    pub fn is_notable(&self) -> bool {
        matches!(
            self,
            Self::Takeoff | Self::Turn | Self::Cutback | Self::Accelerate | Self::Decelerate
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Takeoff => "takeoff",
            Self::Glide => "glide",
            Self::Turn => "turn",
            Self::Cutback => "cutback",
            Self::Accelerate => "accelerate",
            Self::Decelerate => "decelerate",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SurfAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Frame Analysis
// =============================================================================

/// Structured result for one sampled frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameAnalysis {
    pub timestamp: TimeSec,
    pub surfer_position: SurferPosition,
    pub body_posture: Rating,
    pub wave_condition: String,
    pub current_action: SurfAction,
    pub action_quality: Rating,
    pub timing: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl FrameAnalysis {
    pub const FALLBACK_SUGGESTIONS: [&'static str; 2] =
        ["Keep your current stance", "Try a more aggressive maneuver"];

    /// Neutral result used when a provider reply cannot be decoded.
    pub fn fallback(timestamp: TimeSec) -> Self {
        Self {
            timestamp,
            surfer_position: SurferPosition::Face,
            body_posture: Rating::Good,
            wave_condition: "moderate wave".to_string(),
            current_action: SurfAction::Glide,
            action_quality: Rating::Good,
            timing: "accurate".to_string(),
            suggestions: Self::FALLBACK_SUGGESTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            annotations: Vec::new(),
        }
    }

    /// First suggestion, if any.
    pub fn primary_suggestion(&self) -> Option<&str> {
        self.suggestions.first().map(String::as_str)
    }
}
