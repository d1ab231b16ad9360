//! Hugging Face Provider Implementation
//!
//! Calls a LLaVA model on the hosted inference API with the frame as a data URL.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::decode_envelope;
use super::{ProviderConfig, ProviderId, VisionProvider};
use crate::core::analysis::FrameSample;
use crate::core::{CoreError, CoreResult};

/// Hugging Face inference API provider
pub struct HuggingFaceProvider {
    #[cfg_attr(not(feature = "ai-providers"), allow(dead_code))]
    api_key: String,
    #[cfg_attr(not(feature = "ai-providers"), allow(dead_code))]
    base_url: String,
    model: String,
    #[cfg(feature = "ai-providers")]
    client: reqwest::Client,
}

impl HuggingFaceProvider {
    pub fn new(config: ProviderConfig) -> CoreResult<Self> {
        let api_key = config.require_credential()?.expose().to_string();

        #[cfg(feature = "ai-providers")]
        let client = super::http::build_client(config.timeout_secs)?;

        Ok(Self {
            api_key,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model,
            #[cfg(feature = "ai-providers")]
            client,
        })
    }

    /// Model URL: `{base}/{owner}/{model}`
    pub fn model_url(&self) -> String {
        format!("{}/{}", self.base_url, self.model)
    }

    #[cfg_attr(not(feature = "ai-providers"), allow(dead_code))]
    fn build_request(frame: &FrameSample, prompt: &str) -> InferenceRequest {
        InferenceRequest {
            inputs: InferenceInputs {
                image: frame.image.data_url(),
                text: prompt.to_string(),
            },
        }
    }
}

/// Reads `[0].generated_text`.
#[cfg_attr(not(feature = "ai-providers"), allow(dead_code))]
fn extract_text(body: &str) -> CoreResult<String> {
    let outputs: Vec<GeneratedText> = decode_envelope(ProviderId::HuggingFace, body)?;
    outputs
        .into_iter()
        .next()
        .map(|o| o.generated_text)
        .ok_or_else(|| {
            CoreError::provider(ProviderId::HuggingFace, None, "Empty generation list")
        })
}

// =============================================================================
// Inference API Types
// =============================================================================

#[derive(Serialize)]
struct InferenceRequest {
    inputs: InferenceInputs,
}

#[derive(Serialize)]
struct InferenceInputs {
    image: String,
    text: String,
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: String,
}

// =============================================================================
// VisionProvider Implementation
// =============================================================================

#[async_trait]
impl VisionProvider for HuggingFaceProvider {
    fn id(&self) -> ProviderId {
        ProviderId::HuggingFace
    }

    fn name(&self) -> &str {
        "Hugging Face"
    }

    #[cfg(feature = "ai-providers")]
    async fn analyze(&self, frame: &FrameSample, prompt: &str) -> CoreResult<String> {
        let request = self
            .client
            .post(self.model_url())
            .bearer_auth(&self.api_key)
            .json(&Self::build_request(frame, prompt));

        let body = super::http::send(ProviderId::HuggingFace, request).await?;
        extract_text(&body)
    }

    #[cfg(not(feature = "ai-providers"))]
    async fn analyze(&self, _frame: &FrameSample, _prompt: &str) -> CoreResult<String> {
        Err(CoreError::NotSupported(
            "AI providers feature not enabled. Build with --features ai-providers".to_string(),
        ))
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }
}
