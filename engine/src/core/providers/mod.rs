//! Vision Providers
//!
//! Registry of backend configs and the adapters that talk to them.

mod config;
mod gemini;
mod http;
mod huggingface;
mod local;
mod provider;
mod registry;
mod zhipu;

pub use config::{Credential, ProviderConfig, ProviderId, ProviderStatus, Quota, QuotaPeriod};
pub use gemini::GeminiProvider;
pub use huggingface::HuggingFaceProvider;
pub use local::{LocalCoachProvider, RidePhase};
pub use provider::{MockReply, MockVisionProvider, VisionProvider};
pub use registry::ProviderRegistry;
pub use zhipu::ZhipuProvider;

use crate::core::{CoreError, CoreResult};

// =============================================================================
// Provider Factory
// =============================================================================

/// Creates the adapter for a registered config.
///
/// Text-only backends are rejected here with a configuration error so they
/// never get as far as a network call.
pub fn create_provider(config: ProviderConfig) -> CoreResult<Box<dyn VisionProvider>> {
    if !config.supports_vision {
        return Err(CoreError::Configuration(format!(
            "{} does not support image analysis",
            config.name
        )));
    }

    match config.id {
        ProviderId::Gemini => Ok(Box::new(GeminiProvider::new(config)?)),
        ProviderId::HuggingFace => Ok(Box::new(HuggingFaceProvider::new(config)?)),
        ProviderId::Zhipu => Ok(Box::new(ZhipuProvider::new(config)?)),
        ProviderId::Local => Ok(Box::new(LocalCoachProvider::new(config)?)),
        ProviderId::Groq => Err(CoreError::Configuration(
            "Groq has no vision adapter".to_string(),
        )),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_provider_dispatch() {
        let provider = create_provider(ProviderConfig::gemini().with_credential("k")).unwrap();
        assert_eq!(provider.id(), ProviderId::Gemini);

        let provider = create_provider(ProviderConfig::huggingface().with_credential("k")).unwrap();
        assert_eq!(provider.id(), ProviderId::HuggingFace);

        let provider = create_provider(ProviderConfig::zhipu().with_credential("k")).unwrap();
        assert_eq!(provider.id(), ProviderId::Zhipu);

        let provider = create_provider(ProviderConfig::local()).unwrap();
        assert_eq!(provider.id(), ProviderId::Local);
    }

    #[test]
    fn test_groq_rejected_as_configuration_error() {
        let err = create_provider(ProviderConfig::groq().with_credential("k"))
            .err()
            .unwrap();
        assert!(matches!(err, CoreError::Configuration(_)));
    }

    #[test]
    fn test_missing_credential_rejected() {
        let err = create_provider(ProviderConfig::gemini()).err().unwrap();
        assert!(matches!(err, CoreError::Configuration(_)));
    }
}
