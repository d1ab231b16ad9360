//! Shared HTTP plumbing for the remote adapters.

use serde::Deserialize;

use super::ProviderId;
use crate::core::{CoreError, CoreResult};

/// Longest slice of an error body carried into a provider error.
const MAX_ERROR_BODY: usize = 500;

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    Nested { error: ErrorDetail },
    Flat { error: String },
    Message { message: String },
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Pulls a readable message out of a backend error body, falling back to the
/// (truncated) raw text.
#[cfg_attr(not(feature = "ai-providers"), allow(dead_code))]
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody::Nested { error }) => error.message,
        Ok(ErrorBody::Flat { error }) => error,
        Ok(ErrorBody::Message { message }) => message,
        Err(_) => {
            let trimmed = body.trim();
            match trimmed.char_indices().nth(MAX_ERROR_BODY) {
                Some((cut, _)) => format!("{}...", &trimmed[..cut]),
                None => trimmed.to_string(),
            }
        }
    }
}

/// Builds the HTTP client with the provider's request timeout.
#[cfg(feature = "ai-providers")]
pub(crate) fn build_client(timeout_secs: u64) -> CoreResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs.max(1)))
        .build()
        .map_err(|e| CoreError::Internal(format!("Failed to create HTTP client: {}", e)))
}

/// Sends a request and returns the body of a 2xx response.
#[cfg(feature = "ai-providers")]
pub(crate) async fn send(
    provider: ProviderId,
    request: reqwest::RequestBuilder,
) -> CoreResult<String> {
    let response = request
        .send()
        .await
        .map_err(|e| transport_error(provider, e.is_timeout(), &e.to_string()))?;

    let status = response.status();
    let body = response.text().await.map_err(|e| {
        CoreError::provider(
            provider,
            Some(status.as_u16()),
            format!("Failed to read response: {}", e),
        )
    })?;

    if !status.is_success() {
        return Err(CoreError::provider(
            provider,
            Some(status.as_u16()),
            error_message(&body),
        ));
    }

    Ok(body)
}

/// Maps a failed send to `Timeout` or a status-less provider error.
#[cfg_attr(not(feature = "ai-providers"), allow(dead_code))]
pub(crate) fn transport_error(provider: ProviderId, timed_out: bool, detail: &str) -> CoreError {
    if timed_out {
        CoreError::Timeout(format!("{} request timed out: {}", provider, detail))
    } else {
        CoreError::provider(provider, None, format!("Request failed: {}", detail))
    }
}

/// Decodes a success envelope, mapping shape mismatches to a provider error.
#[cfg_attr(not(feature = "ai-providers"), allow(dead_code))]
pub(crate) fn decode_envelope<T: serde::de::DeserializeOwned>(
    provider: ProviderId,
    body: &str,
) -> CoreResult<T> {
    serde_json::from_str(body).map_err(|e| {
        CoreError::provider(provider, None, format!("Malformed response envelope: {}", e))
    })
}
