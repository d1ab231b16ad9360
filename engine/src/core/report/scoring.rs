//! Score tables
//!
//! Maps ratings and timing text onto the 0-10 scale.

use crate::core::analysis::FrameAnalysis;

/// Timing keyword tiers, checked in order, first hit wins.
const TIMING_TIERS: &[(f64, &[&str])] = &[
    (9.0, &["accurate", "excellent", "optimal", "perfect", "准确", "优秀"]),
    (7.0, &["good", "fine", "nice", "not bad", "良好", "不错"]),
    (
        5.0,
        &["needs improvement", "needs-improvement", "delayed", "late", "early", "需改进", "延迟"],
    ),
];

/// Score for text that matches no keyword.
pub const UNMATCHED_SCORE: f64 = 6.0;

/// Scores timing text. Empty text is not scorable.
pub fn timing_score(timing: &str) -> Option<f64> {
    let text = timing.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }
    let score = TIMING_TIERS
        .iter()
        .find(|(_, words)| words.iter().any(|w| text.contains(w)))
        .map(|(score, _)| *score)
        .unwrap_or(UNMATCHED_SCORE);
    Some(score)
}

/// Per-frame scores on the three scored axes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameScores {
    /// From body posture
    pub balance: Option<f64>,
    /// From action quality
    pub technique: Option<f64>,
    pub timing: Option<f64>,
}

impl FrameScores {
    pub fn of(analysis: &FrameAnalysis) -> Self {
        Self {
            balance: Some(analysis.body_posture.score()),
            technique: Some(analysis.action_quality.score()),
            timing: timing_score(&analysis.timing),
        }
    }

    /// Mean of the defined scores, `None` when the frame has none.
    pub fn mean(&self) -> Option<f64> {
        mean([self.balance, self.technique, self.timing].into_iter().flatten())
    }
}

/// Arithmetic mean, `None` for an empty input.
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Short verdict for an overall score.
pub fn verdict(score: f64) -> &'static str {
    if score >= 9.0 {
        "Outstanding"
    } else if score >= 8.0 {
        "Excellent"
    } else if score >= 7.0 {
        "Good, room to grow"
    } else if score >= 6.0 {
        "Fair, keep practicing"
    } else {
        "Needs more practice"
    }
}
