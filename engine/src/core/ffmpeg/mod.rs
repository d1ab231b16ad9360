//! FFmpeg Integration Module
//!
//! Drives system-installed `ffmpeg`/`ffprobe` binaries to read video files:
//! - Binary detection on PATH and common install locations
//! - Duration and stream metadata via ffprobe
//! - Single-frame JPEG capture as a [`VideoSource`](crate::core::analysis::VideoSource)

mod detection;
mod probe;
mod source;

pub use detection::*;
pub use probe::{probe, VideoProbe};
pub use source::FfmpegVideoSource;

use crate::core::CoreError;

/// FFmpeg-related error types
#[derive(Debug, thiserror::Error)]
pub enum FFmpegError {
    #[error("FFmpeg not found. Please install FFmpeg and make sure it is on PATH.")]
    NotFound,

    #[error("FFmpeg execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Invalid input file: {0}")]
    InvalidInput(String),

    #[error("FFprobe error: {0}")]
    ProbeError(String),

    #[error("Process error: {0}")]
    ProcessError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),
}

pub type FFmpegResult<T> = Result<T, FFmpegError>;

impl From<FFmpegError> for CoreError {
    fn from(err: FFmpegError) -> Self {
        match err {
            FFmpegError::NotFound => CoreError::Configuration(err.to_string()),
            other => CoreError::InvalidInput(other.to_string()),
        }
    }
}
