//! Vision Provider Trait
//!
//! The one capability every backend offers: image + prompt in, raw text out.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::ProviderId;
use crate::core::analysis::FrameSample;
use crate::core::{CoreError, CoreResult, TimeSec};

// =============================================================================
// Vision Provider Trait
// =============================================================================

/// A vision backend (Gemini, Hugging Face, Zhipu, local templates, ...).
#[async_trait]
pub trait VisionProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Human readable provider name
    fn name(&self) -> &str;

    /// Submits one frame with the canonical prompt and returns the reply text.
    ///
    /// Non-2xx replies and transport failures surface as
    /// [`CoreError::Provider`]. The returned text is not validated.
    async fn analyze(&self, frame: &FrameSample, prompt: &str) -> CoreResult<String>;

    /// Performs a lightweight connectivity/auth check.
    async fn health_check(&self) -> CoreResult<()> {
        Ok(())
    }

    fn is_available(&self) -> bool;
}

#[async_trait]
impl<T: VisionProvider + ?Sized> VisionProvider for Arc<T> {
    fn id(&self) -> ProviderId {
        (**self).id()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    async fn analyze(&self, frame: &FrameSample, prompt: &str) -> CoreResult<String> {
        (**self).analyze(frame, prompt).await
    }

    async fn health_check(&self) -> CoreResult<()> {
        (**self).health_check().await
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}

// =============================================================================
// Mock Provider (for testing)
// =============================================================================

/// One scripted reply of [`MockVisionProvider`].
#[derive(Clone, Debug)]
pub enum MockReply {
    Text(String),
    /// Fails with a provider error carrying this status
    Failure(u16, String),
}

/// Mock provider returning scripted replies in call order.
///
/// Once the script runs out, `default_response` is returned.
pub struct MockVisionProvider {
    id: ProviderId,
    name: String,
    default_response: String,
    script: Mutex<VecDeque<MockReply>>,
    calls: AtomicUsize,
    seen_timestamps: Mutex<Vec<TimeSec>>,
    delay: Option<Duration>,
}

impl MockVisionProvider {
    pub fn new(id: ProviderId) -> Self {
        Self {
            id,
            name: format!("mock-{}", id),
            default_response: Self::SAMPLE_RESPONSE.to_string(),
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            seen_timestamps: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Well-formed reply used when nothing else is scripted.
    pub const SAMPLE_RESPONSE: &'static str = r#"{
        "surfer_position": "face",
        "body_posture": "excellent",
        "wave_condition": "clean shoulder-high wave",
        "current_action": "turn",
        "action_quality": "good",
        "timing": "accurate",
        "suggestions": ["Look where you want to go"]
    }"#;

    /// Sets the reply returned after the script is exhausted
    pub fn with_response(mut self, response: &str) -> Self {
        self.default_response = response.to_string();
        self
    }

    /// Simulates network latency on every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queues a reply
    pub fn then(self, reply: MockReply) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reply);
        }
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_timestamps(&self) -> Vec<TimeSec> {
        self.seen_timestamps
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl VisionProvider for MockVisionProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(&self, frame: &FrameSample, _prompt: &str) -> CoreResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen_timestamps.lock() {
            seen.push(frame.timestamp);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Failure(status, message)) => {
                Err(CoreError::provider(self.id, Some(status), message))
            }
            None => Ok(self.default_response.clone()),
        }
    }

    fn is_available(&self) -> bool {
        true
    }
}

// =============================================================================
// Tests
// =============================================================================
