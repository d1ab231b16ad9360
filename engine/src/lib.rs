//! WaveCoach Core Library
//!
//! Samples frames from a surf video, sends them to a vision provider, turns
//! the replies into structured frame analyses and annotations, and aggregates
//! a scored coaching report.
//!
//! ## Entry points
//!
//! - [`core::analysis::AnalysisOrchestrator`] drives a run end to end.
//! - [`core::report::aggregate`] builds the report from frame results.
//! - [`core::render::AnnotationRenderer`] draws time-matched annotations.

pub mod core;

pub use crate::core::{CoreError, CoreResult};
