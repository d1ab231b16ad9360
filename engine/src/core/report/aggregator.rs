//! Report Aggregator
//!
//! Pure function from the ordered frame results of a run to its report.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::flow::flow_score;
use super::scoring::{mean, verdict, FrameScores};
use crate::core::analysis::{FrameAnalysis, Rating, SurfAction};
use crate::core::{round1, TimeSec};

/// How many recommendations a report carries.
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Description used for key moments without a suggestion.
pub const KEY_MOMENT_PLACEHOLDER: &str = "Key moment";

/// A frame whose action is one of the notable maneuvers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMoment {
    pub timestamp: TimeSec,
    pub action: SurfAction,
    pub quality: Rating,
    pub description: String,
}

/// Four-axis scoring summary.
///
/// Axes without any scorable frame are `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalBreakdown {
    pub balance: Option<f64>,
    pub timing: Option<f64>,
    pub technique: Option<f64>,
    pub flow: f64,
}

/// Scored coaching report for one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub total_frames: usize,
    /// Timestamp of the last analyzed frame
    pub duration: TimeSec,
    pub overall_score: f64,
    pub verdict: String,
    pub key_moments: Vec<KeyMoment>,
    pub recommendations: Vec<String>,
    pub technical_breakdown: TechnicalBreakdown,
    pub provider_name: String,
    pub generated_at: DateTime<Utc>,
}

/// Builds the report for `results`, given in frame order.
pub fn aggregate(results: &[FrameAnalysis], provider_name: &str) -> Report {
    let scores: Vec<FrameScores> = results.iter().map(FrameScores::of).collect();
    let overall_score = overall_score(&scores);

    Report {
        total_frames: results.len(),
        duration: results.last().map(|f| f.timestamp).unwrap_or(0.0),
        overall_score,
        verdict: verdict(overall_score).to_string(),
        key_moments: key_moments(results),
        recommendations: recommendations(results),
        technical_breakdown: TechnicalBreakdown {
            balance: mean(scores.iter().filter_map(|s| s.balance)).map(round1),
            timing: mean(scores.iter().filter_map(|s| s.timing)).map(round1),
            technique: mean(scores.iter().filter_map(|s| s.technique)).map(round1),
            flow: flow_score(results.iter().map(|f| f.current_action)),
        },
        provider_name: provider_name.to_string(),
        generated_at: Utc::now(),
    }
}

/// Mean of per-frame means; frames with nothing scorable are skipped.
/// `0.0` when no frame is scorable.
pub fn overall_score(scores: &[FrameScores]) -> f64 {
    mean(scores.iter().filter_map(FrameScores::mean))
        .map(round1)
        .unwrap_or(0.0)
}

pub fn key_moments(results: &[FrameAnalysis]) -> Vec<KeyMoment> {
    results
        .iter()
        .filter(|f| f.current_action.is_notable())
        .map(|f| KeyMoment {
            timestamp: f.timestamp,
            action: f.current_action,
            quality: f.action_quality.clone(),
            description: f
                .primary_suggestion()
                .unwrap_or(KEY_MOMENT_PLACEHOLDER)
                .to_string(),
        })
        .collect()
}

/// Most frequent suggestions, ties in first-seen order.
pub fn recommendations(results: &[FrameAnalysis]) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for suggestion in results.iter().flat_map(|f| f.suggestions.iter()) {
        match index.get(suggestion.as_str()) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(suggestion.as_str(), counts.len());
                counts.push((suggestion.as_str(), 1));
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(MAX_RECOMMENDATIONS)
        .map(|(s, _)| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analysis::ResponseParser;

    fn frame(t: f64, action: SurfAction, suggestions: &[&str]) -> FrameAnalysis {
        let mut f = FrameAnalysis::fallback(t);
        f.current_action = action;
        f.suggestions = suggestions.iter().map(|s| s.to_string()).collect();
        f
    }

    // -------------------------------------------------------------------------
    // Overall score
    // -------------------------------------------------------------------------

    #[test]
    fn test_overall_score_posture_only() {
        let scores: Vec<FrameScores> = [9.0, 7.0, 5.0]
            .into_iter()
            .map(|b| FrameScores {
                balance: Some(b),
                ..Default::default()
            })
            .collect();
        assert_eq!(overall_score(&scores), 7.0);
    }

    #[test]
    fn test_overall_score_skips_unscorable_frames() {
        let scores = vec![
            FrameScores {
                balance: Some(9.0),
                technique: Some(7.0),
                timing: None,
            },
            FrameScores::default(),
        ];
        assert_eq!(overall_score(&scores), 8.0);
        assert_eq!(overall_score(&[FrameScores::default()]), 0.0);
        assert_eq!(overall_score(&[]), 0.0);
    }

    #[test]
    fn test_aggregate_scores_from_ratings() {
        let mut frames = Vec::new();
        for (t, rating, timing) in [
            (0.0, Rating::Excellent, "accurate"),
            (2.0, Rating::Good, "good"),
            (4.0, Rating::NeedsImprovement, "delayed"),
        ] {
            let mut f = FrameAnalysis::fallback(t);
            f.body_posture = rating.clone();
            f.action_quality = rating;
            f.timing = timing.into();
            frames.push(f);
        }

        let report = aggregate(&frames, "mock");
        assert_eq!(report.overall_score, 7.0);
        assert_eq!(report.technical_breakdown.balance, Some(7.0));
        assert_eq!(report.technical_breakdown.technique, Some(7.0));
        assert_eq!(report.technical_breakdown.timing, Some(7.0));
        assert_eq!(report.verdict, "Good, room to grow");
        assert_eq!(report.total_frames, 3);
        assert_eq!(report.duration, 4.0);
    }

    #[test]
    fn test_aggregate_off_tier_labels_score_six() {
        let raw = r#"{"surfer_position":"face","body_posture":"average",
            "current_action":"bottom turn","action_quality":"fair",
            "timing":"a bit rushed","suggestions":["Compress more"]}"#;
        let frames = vec![ResponseParser::new().try_parse(raw, 0.0).unwrap()];

        let report = aggregate(&frames, "mock");
        assert_eq!(report.technical_breakdown.balance, Some(6.0));
        assert_eq!(report.technical_breakdown.technique, Some(6.0));
        assert_eq!(report.technical_breakdown.timing, Some(6.0));
        assert_eq!(report.overall_score, 6.0);
        assert_eq!(report.key_moments.len(), 1);
        assert_eq!(report.key_moments[0].action, SurfAction::Turn);
        assert_eq!(report.key_moments[0].quality, Rating::Other("fair".to_string()));
        assert_eq!(report.key_moments[0].description, "Compress more");
    }

    // -------------------------------------------------------------------------
    // Key moments and recommendations
    // -------------------------------------------------------------------------

    #[test]
    fn test_key_moments_in_frame_order() {
        let frames = vec![
            frame(0.0, SurfAction::Takeoff, &["Pop up faster"]),
            frame(2.0, SurfAction::Glide, &["Relax"]),
            frame(4.0, SurfAction::Cutback, &[]),
            frame(6.0, SurfAction::Unknown, &[]),
            frame(8.0, SurfAction::Decelerate, &["Shift forward"]),
        ];
        let moments = key_moments(&frames);
        let summary: Vec<(f64, SurfAction, &str)> = moments
            .iter()
            .map(|m| (m.timestamp, m.action, m.description.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (0.0, SurfAction::Takeoff, "Pop up faster"),
                (4.0, SurfAction::Cutback, KEY_MOMENT_PLACEHOLDER),
                (8.0, SurfAction::Decelerate, "Shift forward"),
            ]
        );
    }

    #[test]
    fn test_recommendations_tie_break_first_seen() {
        let frames = vec![
            frame(0.0, SurfAction::Glide, &["A", "B"]),
            frame(1.0, SurfAction::Glide, &["C", "B"]),
            frame(2.0, SurfAction::Glide, &["A", "B", "A"]),
        ];
        assert_eq!(recommendations(&frames), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_recommendations_capped_at_five() {
        let frames = vec![frame(
            0.0,
            SurfAction::Glide,
            &["a", "b", "c", "d", "e", "f", "g"],
        )];
        assert_eq!(recommendations(&frames), vec!["a", "b", "c", "d", "e"]);
    }

    // -------------------------------------------------------------------------
    // Edge cases
    // -------------------------------------------------------------------------

    #[test]
    fn test_empty_results() {
        let report = aggregate(&[], "none");
        assert_eq!(report.total_frames, 0);
        assert_eq!(report.duration, 0.0);
        assert_eq!(report.overall_score, 0.0);
        assert_eq!(report.technical_breakdown.balance, None);
        assert_eq!(report.technical_breakdown.timing, None);
        assert_eq!(report.technical_breakdown.flow, 8.0);
        assert!(report.key_moments.is_empty());
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_flow_in_report() {
        let frames = vec![
            frame(0.0, SurfAction::Takeoff, &[]),
            frame(1.0, SurfAction::Glide, &[]),
            frame(2.0, SurfAction::Takeoff, &[]),
        ];
        assert_eq!(aggregate(&frames, "x").technical_breakdown.flow, 7.9);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = aggregate(&[FrameAnalysis::fallback(0.0)], "Google Gemini");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["totalFrames"], 1);
        assert_eq!(json["providerName"], "Google Gemini");
        assert!(json["technicalBreakdown"]["flow"].is_number());
        assert!(json.get("generatedAt").is_some());
    }
}
