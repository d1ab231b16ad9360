//! Zhipu AI Provider Implementation
//!
//! OpenAI-style chat completion against GLM-4V with an `image_url` content part.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::decode_envelope;
use super::{ProviderConfig, ProviderId, VisionProvider};
use crate::core::analysis::FrameSample;
use crate::core::{CoreError, CoreResult};

/// Zhipu AI (GLM-4V) provider
pub struct ZhipuProvider {
    #[cfg_attr(not(feature = "ai-providers"), allow(dead_code))]
    api_key: String,
    #[cfg_attr(not(feature = "ai-providers"), allow(dead_code))]
    endpoint: String,
    #[cfg_attr(not(feature = "ai-providers"), allow(dead_code))]
    model: String,
    #[cfg(feature = "ai-providers")]
    client: reqwest::Client,
}

impl ZhipuProvider {
    pub const TEMPERATURE: f32 = 0.3;
    pub const MAX_TOKENS: u32 = 1000;

    pub fn new(config: ProviderConfig) -> CoreResult<Self> {
        let api_key = config.require_credential()?.expose().to_string();

        #[cfg(feature = "ai-providers")]
        let client = super::http::build_client(config.timeout_secs)?;

        Ok(Self {
            api_key,
            endpoint: config.endpoint,
            model: config.model,
            #[cfg(feature = "ai-providers")]
            client,
        })
    }

    #[cfg_attr(not(feature = "ai-providers"), allow(dead_code))]
    fn build_request(&self, frame: &FrameSample, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text {
                        text: prompt.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: frame.image.data_url(),
                        },
                    },
                ],
            }],
            max_tokens: Self::MAX_TOKENS,
            temperature: Self::TEMPERATURE,
        }
    }
}

/// Reads `choices[0].message.content`.
#[cfg_attr(not(feature = "ai-providers"), allow(dead_code))]
fn extract_text(body: &str) -> CoreResult<String> {
    let response: ChatResponse = decode_envelope(ProviderId::Zhipu, body)?;
    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| CoreError::provider(ProviderId::Zhipu, None, "No choices returned"))
}

// =============================================================================
// Chat API Types
// =============================================================================

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

// =============================================================================
// VisionProvider Implementation
// =============================================================================

#[async_trait]
impl VisionProvider for ZhipuProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Zhipu
    }

    fn name(&self) -> &str {
        "Zhipu AI"
    }

    #[cfg(feature = "ai-providers")]
    async fn analyze(&self, frame: &FrameSample, prompt: &str) -> CoreResult<String> {
        let request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.build_request(frame, prompt));

        let body = super::http::send(ProviderId::Zhipu, request).await?;
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
