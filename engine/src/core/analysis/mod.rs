//! Frame Analysis
//!
//! Sampling pipeline: prompt building, reply decoding and the run orchestrator.

mod models;
pub mod orchestrator;
mod parser;
mod prompt;
mod video;

pub use models::*;
pub use orchestrator::{
    frame_timestamps, AnalysisOrchestrator, AnalysisRun, NoProgress, ProgressSink,
    ProviderFactory,
};
pub use parser::ResponseParser;
pub use prompt::{AnalysisLevel, PromptBuilder};
pub use video::VideoSource;
