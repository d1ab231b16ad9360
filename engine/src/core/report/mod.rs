//! Report
//!
//! Scores, key moments and recommendations aggregated from a run's frames.

mod aggregator;
pub mod flow;
pub mod scoring;

pub use aggregator::{
    aggregate, key_moments, overall_score, recommendations, KeyMoment, Report,
    TechnicalBreakdown, KEY_MOMENT_PLACEHOLDER, MAX_RECOMMENDATIONS,
};
pub use flow::{flow_score, is_natural_transition};
pub use scoring::{timing_score, verdict, FrameScores};
