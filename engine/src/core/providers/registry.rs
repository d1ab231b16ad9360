//! Provider Registry
//!
//! Holds every registered backend config plus the process-wide active selection.

use std::collections::BTreeMap;

use super::{Credential, ProviderConfig, ProviderId, ProviderStatus};
use crate::core::{CoreError, CoreResult};

/// Registered providers and the single active one.
#[derive(Clone, Debug)]
pub struct ProviderRegistry {
    configs: BTreeMap<ProviderId, ProviderConfig>,
    active: ProviderId,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ProviderRegistry {
    /// Default active provider
    pub const DEFAULT_ACTIVE: ProviderId = ProviderId::Gemini;

    /// Creates an empty registry with `active` selected but not yet registered.
    pub fn empty(active: ProviderId) -> Self {
        Self {
            configs: BTreeMap::new(),
            active,
        }
    }

    /// Registry with every built-in backend, Gemini active.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty(Self::DEFAULT_ACTIVE);
        for id in ProviderId::ALL {
            registry.register(ProviderConfig::builtin(id));
        }
        registry
    }

    /// Registers (or replaces) a provider config.
    pub fn register(&mut self, config: ProviderConfig) {
        self.configs.insert(config.id, config);
    }

    pub fn get(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.configs.get(&id)
    }

    pub fn configs(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.configs.values()
    }

    /// Replaces the credential of one provider. An empty secret clears it.
    pub fn set_credential(&mut self, id: ProviderId, secret: &str) -> CoreResult<()> {
        let config = self
            .configs
            .get_mut(&id)
            .ok_or_else(|| CoreError::Configuration(format!("Provider not registered: {}", id)))?;

        let credential = Credential::new(secret);
        config.credential = if credential.is_empty() {
            None
        } else {
            Some(credential)
        };
        let state = if config.has_credential() { "set" } else { "cleared" };
        tracing::info!("{} API key {}", config.name, state);
        Ok(())
    }

    /// Switches the active provider.
    pub fn set_active(&mut self, id: ProviderId) -> CoreResult<()> {
        let config = self
            .configs
            .get(&id)
            .ok_or_else(|| CoreError::Configuration(format!("Provider not registered: {}", id)))?;
        tracing::info!("Switched active provider to {}", config.name);
        self.active = id;
        Ok(())
    }

    pub fn active_id(&self) -> ProviderId {
        self.active
    }

    pub fn active(&self) -> CoreResult<&ProviderConfig> {
        self.get(self.active).ok_or_else(|| {
            CoreError::Configuration(format!("Active provider not registered: {}", self.active))
        })
    }

    /// Checks the active provider can serve a vision analysis run.
    pub fn validate_active(&self) -> CoreResult<&ProviderConfig> {
        let config = self.active()?;
        if !config.supports_vision {
            return Err(CoreError::Configuration(format!(
                "{} does not support image analysis",
                config.name
            )));
        }
        if config.requires_credential {
            config.require_credential()?;
        }
        Ok(config)
    }

    /// Providers that are keyed (or need no key) and vision capable.
    pub fn available_providers(&self) -> Vec<ProviderId> {
        self.configs
            .values()
            .filter(|c| c.is_usable())
            .map(|c| c.id)
            .collect()
    }

    /// Secret-free listing of every registered provider.
    pub fn statuses(&self) -> Vec<ProviderStatus> {
        self.configs
            .values()
            .map(|c| ProviderStatus {
                id: c.id,
                name: c.name.clone(),
                model: c.model.clone(),
                supports_vision: c.supports_vision,
                is_configured: !c.requires_credential || c.has_credential(),
                is_active: c.id == self.active,
                quota: c.quota.to_string(),
            })
            .collect()
    }
}
