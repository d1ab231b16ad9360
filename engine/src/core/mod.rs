//! WaveCoach Core Engine Module
//!
//! Contains the frame-sampling pipeline, provider adapters, annotation
//! engine and report aggregation.

pub mod analysis;
pub mod annotations;
pub mod ffmpeg;
pub mod logging;
pub mod providers;
pub mod render;
pub mod report;
pub mod settings;

mod types;
pub use types::*;

mod error;
pub use error::*;

pub use providers::ProviderId;
