//! Local Coach Provider
//!
//! Offline provider that answers from built-in coaching templates chosen by how
//! far into the run the frame sits. No network, no credential.

use async_trait::async_trait;
use serde_json::json;

use super::{ProviderConfig, ProviderId, VisionProvider};
use crate::core::analysis::FrameSample;
use crate::core::CoreResult;

/// Phase of the ride a frame falls into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RidePhase {
    /// First 30% of the frames
    Start,
    /// Up to 70%
    Middle,
    End,
}

impl RidePhase {
    pub fn for_fraction(fraction: f64) -> Self {
        if fraction < 0.3 {
            RidePhase::Start
        } else if fraction < 0.7 {
            RidePhase::Middle
        } else {
            RidePhase::End
        }
    }
}

/// Template-based offline coach
pub struct LocalCoachProvider {
    name: String,
}

impl LocalCoachProvider {
    pub fn new(config: ProviderConfig) -> CoreResult<Self> {
        Ok(Self { name: config.name })
    }

    fn template(phase: RidePhase, timestamp: f64) -> serde_json::Value {
        match phase {
            RidePhase::Start => json!({
                "surfer_position": "trough",
                "body_posture": "good",
                "wave_condition": "wave building, shoulder starting to form",
                "current_action": "takeoff",
                "action_quality": "good",
                "timing": "good",
                "suggestions": [
                    "Keep a low center of gravity",
                    "Build speed early",
                    "Watch how the wave is shaping up"
                ],
                "timestamp": timestamp
            }),
            RidePhase::Middle => json!({
                "surfer_position": "face",
                "body_posture": "excellent",
                "wave_condition": "open face with good push",
                "current_action": "accelerate",
                "action_quality": "excellent",
                "timing": "accurate",
                "suggestions": [
                    "Drive harder through your legs",
                    "Adjust your body angle",
                    "Set up for the turn"
                ],
                "timestamp": timestamp
            }),
            RidePhase::End => json!({
                "surfer_position": "crest",
                "body_posture": "needs-improvement",
                "wave_condition": "steep section, suited to advanced maneuvers",
                "current_action": "cutback",
                "action_quality": "good",
                "timing": "slightly delayed",
                "suggestions": [
                    "Try a more aggressive cutback",
                    "Vary your speed more",
                    "Link more maneuvers together"
                ],
                "timestamp": timestamp
            }),
        }
    }
}

#[async_trait]
impl VisionProvider for LocalCoachProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Local
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(&self, frame: &FrameSample, _prompt: &str) -> CoreResult<String> {
        let phase = RidePhase::for_fraction(frame.run_fraction());
        tracing::debug!("Local coach answering frame {} as {:?}", frame.index, phase);
        Ok(Self::template(phase, frame.timestamp).to_string())
    }

    fn is_available(&self) -> bool {
        true
    }
}
