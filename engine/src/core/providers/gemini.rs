//! Google Gemini Provider Implementation
//!
//! Sends the frame as `inline_data` next to the prompt via `generateContent`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::decode_envelope;
use super::{ProviderConfig, ProviderId, VisionProvider};
use crate::core::analysis::FrameSample;
use crate::core::{CoreError, CoreResult};

// =============================================================================
// Gemini Provider
// =============================================================================

/// Google Gemini API provider
pub struct GeminiProvider {
    /// API key
    #[cfg_attr(not(feature = "ai-providers"), allow(dead_code))]
    api_key: String,
    /// Base URL for API requests
    #[cfg_attr(not(feature = "ai-providers"), allow(dead_code))]
    base_url: String,
    model: String,
    /// HTTP client
    #[cfg(feature = "ai-providers")]
    client: reqwest::Client,
}

impl GeminiProvider {
    pub const TEMPERATURE: f32 = 0.3;
    pub const MAX_OUTPUT_TOKENS: u32 = 1000;

    /// Creates a new Gemini provider
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

    pub fn model(&self) -> &str {
        &self.model
    }

    #[cfg_attr(not(feature = "ai-providers"), allow(dead_code))]
    fn build_request(frame: &FrameSample, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: prompt.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: frame.image.mime_type.clone(),
                            data: frame.image.to_base64(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: Self::TEMPERATURE,
                max_output_tokens: Self::MAX_OUTPUT_TOKENS,
            },
        }
    }
}

/// Pulls `candidates[0].content.parts[0].text` out of a response body.
#[cfg_attr(not(feature = "ai-providers"), allow(dead_code))]
fn extract_text(body: &str) -> CoreResult<String> {
    let response: GenerateContentResponse = decode_envelope(ProviderId::Gemini, body)?;

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(CoreError::provider(
            ProviderId::Gemini,
            None,
            format!("Content blocked by Gemini safety filters: {}", reason),
        ));
    }

    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
        .ok_or_else(|| {
            CoreError::provider(ProviderId::Gemini, None, "No candidates returned from Gemini")
        })
}

// =============================================================================
// Gemini API Types
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

// =============================================================================
// VisionProvider Implementation
// =============================================================================

#[async_trait]
impl VisionProvider for GeminiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn name(&self) -> &str {
        "Google Gemini"
    }

    #[cfg(feature = "ai-providers")]
    async fn analyze(&self, frame: &FrameSample, prompt: &str) -> CoreResult<String> {
        let body = Self::build_request(frame, prompt);

        // API key travels in a header so it never shows up in logged URLs.
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body);

        let text = super::http::send(ProviderId::Gemini, request).await?;
        extract_text(&text)
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

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analysis::EncodedImage;

    fn frame() -> FrameSample {
        FrameSample {
            timestamp: 2.0,
            image: EncodedImage::jpeg(vec![0xff, 0xd8, 0xff]),
            index: 1,
            total: 3,
        }
    }

    #[test]
    fn test_gemini_requires_key() {
        let err = GeminiProvider::new(ProviderConfig::gemini()).err().unwrap();
        assert!(matches!(err, CoreError::Configuration(_)));
    }

    #[test]
    fn test_gemini_creation() {
        let config = ProviderConfig::gemini().with_credential("key");
        let provider = GeminiProvider::new(config).unwrap();
        assert_eq!(provider.id(), ProviderId::Gemini);
        assert_eq!(provider.model(), "gemini-1.5-flash");
        assert!(provider.is_available());
    }

    #[test]
    fn test_request_body_shape() {
        let request = GeminiProvider::build_request(&frame(), "describe");
        let body = serde_json::to_value(request).unwrap();
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "describe");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[1]["inline_data"]["data"], "/9j/");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1000);
    }

    #[test]
    fn test_extract_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":1}"}]}}]}"#;
        assert_eq!(extract_text(body).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_extract_text_without_candidates() {
        let err = extract_text(r#"{"candidates":[]}"#).unwrap_err();
        assert!(matches!(err, CoreError::Provider { .. }));

        let err = extract_text(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }
}
