//! Video Source
//!
//! The playback collaborator the orchestrator samples from.

use async_trait::async_trait;

use super::EncodedImage;
use crate::core::{CoreResult, TimeSec};

/// A seekable video that can hand out its currently displayed frame.
#[async_trait]
pub trait VideoSource: Send {
    /// Total duration in seconds, `None` while metadata is unknown.
    async fn duration(&self) -> Option<TimeSec>;

    /// Seeks to `t`. Resolves once the seek has completed.
    async fn seek(&mut self, t: TimeSec) -> CoreResult<()>;

    /// Captures the currently displayed frame.
    async fn capture_frame(&mut self) -> CoreResult<EncodedImage>;
}

// =============================================================================
// Test Double
// =============================================================================

/// In-memory video for tests: fixed duration, optional seek stall.
#[cfg(test)]
pub(crate) struct StaticVideo {
    pub duration: Option<TimeSec>,
    pub position: TimeSec,
    pub seek_delay: Option<std::time::Duration>,
    pub fail_capture_at: Option<TimeSec>,
    pub seeks: Vec<TimeSec>,
}

#[cfg(test)]
impl StaticVideo {
    pub fn new(duration: Option<TimeSec>) -> Self {
        Self {
            duration,
            position: 0.0,
            seek_delay: None,
            fail_capture_at: None,
            seeks: Vec::new(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl VideoSource for StaticVideo {
    async fn duration(&self) -> Option<TimeSec> {
        self.duration
    }

    async fn seek(&mut self, t: TimeSec) -> CoreResult<()> {
        self.seeks.push(t);
        if let Some(delay) = self.seek_delay {
            tokio::time::sleep(delay).await;
        }
        self.position = t;
        Ok(())
    }

    async fn capture_frame(&mut self) -> CoreResult<EncodedImage> {
        if self.fail_capture_at == Some(self.position) {
            return Err(crate::core::CoreError::InvalidInput(
                "decoder returned no frame".to_string(),
            ));
        }
        Ok(EncodedImage::jpeg(format!("frame@{}", self.position).into_bytes()))
    }
}
