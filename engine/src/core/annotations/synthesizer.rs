//! Annotation Synthesizer
//!
//! Derives default annotations from a frame analysis when the provider did not
//! send any of its own. Each rule fires at most once per frame.

use super::models::styles;
use super::{Annotation, AnnotationKind};
use crate::core::analysis::{FrameAnalysis, Rating};
use crate::core::AnnotationPoint;

pub const SPEED_LINE_LABEL: &str = "Speed zones";
pub const SPEED_LINE_DESCRIPTION: &str =
    "Fastest at the crest, moderate on the face, slowest in the trough";
pub const ACTION_PLACEHOLDER: &str = "Action tip";
pub const BALANCE_LABEL: &str = "Shift your weight";
pub const BALANCE_DESCRIPTION: &str = "Adjust your center of gravity for better balance";

/// Derives the rule-based annotations for one frame.
pub fn synthesize(analysis: &FrameAnalysis) -> Vec<Annotation> {
    let t = analysis.timestamp;
    let mut out = Vec::with_capacity(3);

    // Position is always defined, so the speed-zone guide always appears.
    out.push(
        Annotation::new(
            AnnotationKind::Line,
            AnnotationPoint::new(20.0, 20.0),
            styles::SPEED_LINE,
            SPEED_LINE_LABEL,
            t,
        )
        .with_description(SPEED_LINE_DESCRIPTION),
    );

    if analysis.current_action.is_known() {
        out.push(
            Annotation::new(
                AnnotationKind::Arrow,
                AnnotationPoint::new(50.0, 50.0),
                styles::ACTION_ARROW,
                analysis.current_action.as_str(),
                t,
            )
            .with_description(analysis.primary_suggestion().unwrap_or(ACTION_PLACEHOLDER)),
        );
    }

    if analysis.body_posture == Rating::NeedsImprovement {
        out.push(
            Annotation::new(
                AnnotationKind::Circle,
                AnnotationPoint::new(60.0, 40.0),
                styles::BALANCE_CIRCLE,
                BALANCE_LABEL,
                t,
            )
            .with_description(BALANCE_DESCRIPTION),
        );
    }

    out
}

/// Fills `analysis.annotations` from the rules unless the provider supplied some.
///
/// Returns true when annotations were synthesized.
pub fn annotate(analysis: &mut FrameAnalysis) -> bool {
    if !analysis.annotations.is_empty() {
        return false;
    }
    analysis.annotations = synthesize(analysis);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analysis::SurfAction;

    #[test]
    fn test_all_rules_fire() {
        let mut analysis = FrameAnalysis::fallback(6.0);
        analysis.current_action = SurfAction::Cutback;
        analysis.body_posture = Rating::NeedsImprovement;
        analysis.suggestions = vec!["Open your shoulders".into()];

        let out = synthesize(&analysis);
        assert_eq!(out.len(), 3);

        assert_eq!(out[0].kind, AnnotationKind::Line);
        assert_eq!(out[0].style, styles::SPEED_LINE);
        assert_eq!(out[0].position, AnnotationPoint::new(20.0, 20.0));

        assert_eq!(out[1].kind, AnnotationKind::Arrow);
        assert_eq!(out[1].text, "cutback");
        assert_eq!(out[1].description.as_deref(), Some("Open your shoulders"));

        assert_eq!(out[2].kind, AnnotationKind::Circle);
        assert_eq!(out[2].position, AnnotationPoint::new(60.0, 40.0));

        assert!(out.iter().all(|a| a.timestamp == 6.0 && a.duration == 3.0));
    }

    #[test]
    fn test_optional_rules_skip_when_not_triggered() {
        let mut analysis = FrameAnalysis::fallback(0.0);
        analysis.current_action = SurfAction::Unknown;
        analysis.body_posture = Rating::Excellent;

        let out = synthesize(&analysis);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].style, styles::SPEED_LINE);
        assert!(!out.iter().any(|a| a.style == styles::ACTION_ARROW));
        assert!(!out.iter().any(|a| a.style == styles::BALANCE_CIRCLE));
    }

    #[test]
    fn test_off_tier_posture_draws_no_balance_circle() {
        let mut analysis = FrameAnalysis::fallback(0.0);
        analysis.body_posture = Rating::Other("average".into());
        let out = synthesize(&analysis);
        assert!(!out.iter().any(|a| a.style == styles::BALANCE_CIRCLE));
    }

    #[test]
    fn test_arrow_placeholder_without_suggestions() {
        let mut analysis = FrameAnalysis::fallback(0.0);
        analysis.suggestions.clear();
        let out = synthesize(&analysis);
        assert_eq!(out[1].description.as_deref(), Some(ACTION_PLACEHOLDER));
    }

    #[test]
    fn test_synthesize_is_deterministic() {
        let analysis = FrameAnalysis::fallback(3.0);
        assert_eq!(synthesize(&analysis), synthesize(&analysis));
    }

    #[test]
    fn test_annotate_keeps_provider_annotations() {
        let mut analysis = FrameAnalysis::fallback(1.0);
        analysis.annotations = vec![Annotation::new(
            AnnotationKind::Text,
            AnnotationPoint::new(5.0, 5.0),
            "note",
            "from provider",
            1.0,
        )];
        assert!(!annotate(&mut analysis));
        assert_eq!(analysis.annotations.len(), 1);

        let mut analysis = FrameAnalysis::fallback(1.0);
        assert!(annotate(&mut analysis));
        assert_eq!(analysis.annotations.len(), 2);
    }
}
