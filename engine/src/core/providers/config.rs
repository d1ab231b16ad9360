//! Provider Configuration
//!
//! Identifiers, credentials and quota descriptors for the vision backends.

use serde::{Deserialize, Serialize};

// =============================================================================
// Provider Id
// =============================================================================

/// Closed set of supported vision backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Google Gemini (generateContent with inline image data)
    Gemini,
    /// Groq chat completions (text only)
    Groq,
    /// Hugging Face inference API (LLaVA)
    HuggingFace,
    /// Zhipu AI GLM-4V chat completions
    Zhipu,
    /// Offline coach that answers from built-in templates
    Local,
}

impl ProviderId {
    pub const ALL: [ProviderId; 5] = [
        ProviderId::Gemini,
        ProviderId::Groq,
        ProviderId::HuggingFace,
        ProviderId::Zhipu,
        ProviderId::Local,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Gemini => "gemini",
            ProviderId::Groq => "groq",
            ProviderId::HuggingFace => "huggingface",
            ProviderId::Zhipu => "zhipu",
            ProviderId::Local => "local",
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderId::Gemini),
            "groq" => Ok(ProviderId::Groq),
            "huggingface" | "hugging-face" | "hf" => Ok(ProviderId::HuggingFace),
            "zhipu" | "glm" => Ok(ProviderId::Zhipu),
            "local" | "offline" => Ok(ProviderId::Local),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

// =============================================================================
// Credential
// =============================================================================

/// Opaque API secret. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into().trim().to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the raw secret for placing in a request header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

// =============================================================================
// Quota
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaPeriod {
    Hour,
    Day,
}

/// Free-tier request allowance advertised by a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Quota {
    PerPeriod { limit: u32, period: QuotaPeriod },
    Unlimited,
}

impl std::fmt::Display for Quota {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quota::PerPeriod { limit, period } => {
                let unit = match period {
                    QuotaPeriod::Hour => "hour",
                    QuotaPeriod::Day => "day",
                };
                write!(f, "{}/{}", limit, unit)
            }
            Quota::Unlimited => f.write_str("unlimited"),
        }
    }
}

// =============================================================================
// Provider Config
// =============================================================================

/// Registered configuration of one backend.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub id: ProviderId,
    pub name: String,
    /// Base endpoint; adapters append model paths where the API needs them.
    pub endpoint: String,
    pub model: String,
    pub credential: Option<Credential>,
    pub supports_vision: bool,
    /// False for providers that run without a secret.
    pub requires_credential: bool,
    pub quota: Quota,
    pub timeout_secs: u64,
}

impl ProviderConfig {
    pub fn gemini() -> Self {
        Self {
            id: ProviderId::Gemini,
            name: "Google Gemini".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            credential: None,
            supports_vision: true,
            requires_credential: true,
            quota: Quota::PerPeriod {
                limit: 1500,
                period: QuotaPeriod::Day,
            },
            timeout_secs: 60,
        }
    }

    pub fn groq() -> Self {
        Self {
            id: ProviderId::Groq,
            name: "Groq".to_string(),
            endpoint: "https://api.groq.com/openai/v1/chat/completions".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            credential: None,
            supports_vision: false,
            requires_credential: true,
            quota: Quota::PerPeriod {
                limit: 14400,
                period: QuotaPeriod::Day,
            },
            timeout_secs: 60,
        }
    }

    pub fn huggingface() -> Self {
        Self {
            id: ProviderId::HuggingFace,
            name: "Hugging Face".to_string(),
            endpoint: "https://api-inference.huggingface.co/models".to_string(),
            model: "llava-hf/llava-1.5-7b-hf".to_string(),
            credential: None,
            supports_vision: true,
            requires_credential: true,
            quota: Quota::PerPeriod {
                limit: 300,
                period: QuotaPeriod::Hour,
            },
            timeout_secs: 120, // cold model loads are slow
        }
    }

    pub fn zhipu() -> Self {
        Self {
            id: ProviderId::Zhipu,
            name: "Zhipu AI".to_string(),
            endpoint: "https://open.bigmodel.cn/api/paas/v4/chat/completions".to_string(),
            model: "glm-4v".to_string(),
            credential: None,
            supports_vision: true,
            requires_credential: true,
            quota: Quota::Unlimited,
            timeout_secs: 60,
        }
    }

    pub fn local() -> Self {
        Self {
            id: ProviderId::Local,
            name: "Local Coach".to_string(),
            endpoint: "local://templates".to_string(),
            model: "templates-v1".to_string(),
            credential: None,
            supports_vision: true,
            requires_credential: false,
            quota: Quota::Unlimited,
            timeout_secs: 0,
        }
    }

    /// Built-in config for an id.
    pub fn builtin(id: ProviderId) -> Self {
        match id {
            ProviderId::Gemini => Self::gemini(),
            ProviderId::Groq => Self::groq(),
            ProviderId::HuggingFace => Self::huggingface(),
            ProviderId::Zhipu => Self::zhipu(),
            ProviderId::Local => Self::local(),
        }
    }

    /// Sets the credential
    pub fn with_credential(mut self, secret: &str) -> Self {
        self.credential = Some(Credential::new(secret));
        self
    }

    /// Sets the model
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Sets the endpoint
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    pub fn has_credential(&self) -> bool {
        self.credential.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// Usable for a frame analysis run: vision capable and, if needed, keyed.
    pub fn is_usable(&self) -> bool {
        self.supports_vision && (!self.requires_credential || self.has_credential())
    }

    /// Returns the credential or a configuration error naming the provider.
    pub fn require_credential(&self) -> crate::core::CoreResult<&Credential> {
        self.credential
            .as_ref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                crate::core::CoreError::Configuration(format!(
                    "{} API key is not set",
                    self.name
                ))
            })
    }
}

/// Serializable view of a provider for listings. Never carries the secret.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub id: ProviderId,
    pub name: String,
    pub model: String,
    pub supports_vision: bool,
    pub is_configured: bool,
    pub is_active: bool,
    pub quota: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_id_parsing() {
        assert_eq!("gemini".parse::<ProviderId>().unwrap(), ProviderId::Gemini);
        assert_eq!("HF".parse::<ProviderId>().unwrap(), ProviderId::HuggingFace);
        assert_eq!("Zhipu".parse::<ProviderId>().unwrap(), ProviderId::Zhipu);
        assert!("openai".parse::<ProviderId>().is_err());
    }

    #[test]
    fn test_provider_id_serde_matches_display() {
        for id in ProviderId::ALL {
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id));
        }
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let config = ProviderConfig::gemini().with_credential("sk-secret-123");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret-123"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_quota_display() {
        assert_eq!(ProviderConfig::gemini().quota.to_string(), "1500/day");
        assert_eq!(ProviderConfig::huggingface().quota.to_string(), "300/hour");
        assert_eq!(ProviderConfig::zhipu().quota.to_string(), "unlimited");
    }

    #[test]
    fn test_usability() {
        assert!(!ProviderConfig::gemini().is_usable());
        assert!(ProviderConfig::gemini().with_credential("k").is_usable());
        assert!(!ProviderConfig::gemini().with_credential("   ").is_usable());
        assert!(!ProviderConfig::groq().with_credential("k").is_usable());
        assert!(ProviderConfig::local().is_usable());
    }
}
