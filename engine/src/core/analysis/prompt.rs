//! Prompt Builder
//!
//! Produces the canonical analysis request sent with every frame.

use serde::{Deserialize, Serialize};

use crate::core::TimeSec;

/// How much detail the provider is asked for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisLevel {
    Simple,
    Standard,
    #[default]
    Detailed,
}

impl std::str::FromStr for AnalysisLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" | "basic" => Ok(Self::Simple),
            "standard" => Ok(Self::Standard),
            "detailed" | "full" => Ok(Self::Detailed),
            _ => Err(format!("Unknown analysis level: {}", s)),
        }
    }
}

const FOCUS_POSITION: &str = "\
1. Surfer position and stance:
   - Where the surfer is on the wave (crest, face, trough)
   - Body posture (stance, center of gravity, arm position)";

const FOCUS_WAVE: &str = "\
2. Wave condition:
   - Shape, size and how much the wave is breaking
   - Speed zones (fastest at the top, moderate in the middle, slowest at the bottom)";

const FOCUS_ACTION: &str = "\
3. Maneuver:
   - Current action (takeoff, glide, turn, cutback, accelerate, decelerate)
   - Whether the action is well executed
   - Whether the timing is right";

const FOCUS_ADVICE: &str = "\
4. Coaching advice:
   - What to improve
   - Suggested adjustments and the best moment to make them";

const SCHEMA: &str = r#"{
  "surfer_position": "crest | face | trough",
  "body_posture": "excellent | good | needs-improvement",
  "wave_condition": "short description of the wave",
  "current_action": "takeoff | glide | turn | cutback | accelerate | decelerate",
  "action_quality": "excellent | good | needs-improvement",
  "timing": "short timing assessment",
  "suggestions": ["specific suggestion 1", "specific suggestion 2"],
  "annotations": [
    {
      "type": "line | text | arrow | circle",
      "position": {"x": 50, "y": 30},
      "style": "speed-line | action-arrow | balance-circle",
      "text": "label",
      "description": "details"
    }
  ]
}"#;

/// Builds per-frame prompts for one analysis level.
#[derive(Clone, Debug, Default)]
pub struct PromptBuilder {
    level: AnalysisLevel,
}

impl PromptBuilder {
    pub fn new(level: AnalysisLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> AnalysisLevel {
        self.level
    }

    /// Prompt for the frame at `timestamp` seconds.
    pub fn build(&self, timestamp: TimeSec) -> String {
        let focus: &[&str] = match self.level {
            AnalysisLevel::Simple => &[FOCUS_POSITION, FOCUS_ACTION],
            AnalysisLevel::Standard => &[FOCUS_POSITION, FOCUS_ACTION, FOCUS_ADVICE],
            AnalysisLevel::Detailed => &[FOCUS_POSITION, FOCUS_WAVE, FOCUS_ACTION, FOCUS_ADVICE],
        };

        format!(
            "Analyze this surfing video frame, focusing on:\n\n{}\n\n\
             Reply with JSON only, using exactly these fields \
             (annotations are optional):\n{}\n\n\
             Timestamp: {:.2}s",
            focus.join("\n\n"),
            SCHEMA,
            timestamp
        )
    }
}
