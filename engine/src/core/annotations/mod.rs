//! Annotations
//!
//! Annotation value objects, the rule-based synthesizer and the time-indexed
//! track a run accumulates.

mod models;
pub mod synthesizer;
mod track;

pub use models::*;
pub use synthesizer::{annotate, synthesize};
pub use track::AnnotationTrack;
