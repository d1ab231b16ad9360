//! Settings Persistence
//!
//! Persistent analysis preferences and provider keys:
//! - Atomic file writes (temp file + rename)
//! - Tolerant decoding with defaults and clamping
//! - Advisory locking against concurrent writers
//!
//! Storage location: {config_dir}/settings.json

use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::analysis::AnalysisLevel;
use crate::core::providers::{ProviderId, ProviderRegistry};
use crate::core::{CoreError, CoreResult};

/// Settings schema version for migration support
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Lock file name (advisory lock to prevent concurrent writers)
pub const SETTINGS_LOCK_FILE: &str = "settings.json.lock";

/// Accepted sampling interval range in seconds
pub const FRAME_INTERVAL_RANGE: (f64, f64) = (0.5, 30.0);

/// Accepted seek timeout range in milliseconds
pub const SEEK_TIMEOUT_RANGE_MS: (u64, u64) = (100, 10_000);

const VIDEO_QUALITIES: [&str; 3] = ["720p", "1080p", "4k"];

// =============================================================================
// Schema
// =============================================================================

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// Schema version for migrations
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub analysis: AnalysisSettings,

    /// API keys per keyed backend
    #[serde(default)]
    pub providers: ProviderKeys,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            analysis: AnalysisSettings::default(),
            providers: ProviderKeys::default(),
        }
    }
}

/// Analysis run preferences
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSettings {
    #[serde(default = "default_provider")]
    pub provider: ProviderId,

    /// Seconds between sampled frames
    #[serde(default = "default_frame_interval")]
    pub frame_interval_secs: f64,

    #[serde(default)]
    pub analysis_level: AnalysisLevel,

    /// "720p", "1080p" or "4k"
    #[serde(default = "default_video_quality")]
    pub video_quality: String,

    #[serde(default = "default_seek_timeout_ms")]
    pub seek_timeout_ms: u64,
}

fn default_provider() -> ProviderId {
    ProviderRegistry::DEFAULT_ACTIVE
}

fn default_frame_interval() -> f64 {
    2.0
}

fn default_video_quality() -> String {
    "1080p".to_string()
}

fn default_seek_timeout_ms() -> u64 {
    1000
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            frame_interval_secs: default_frame_interval(),
            analysis_level: AnalysisLevel::default(),
            video_quality: default_video_quality(),
            seek_timeout_ms: default_seek_timeout_ms(),
        }
    }
}

/// Stored API keys. Blank entries count as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderKeys {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub huggingface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zhipu: Option<String>,
}

impl ProviderKeys {
    pub fn get(&self, id: ProviderId) -> Option<&str> {
        let slot = match id {
            ProviderId::Gemini => &self.gemini,
            ProviderId::Groq => &self.groq,
            ProviderId::HuggingFace => &self.huggingface,
            ProviderId::Zhipu => &self.zhipu,
            ProviderId::Local => return None,
        };
        slot.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Stores a key. A blank key clears the slot.
    pub fn set(&mut self, id: ProviderId, key: &str) -> CoreResult<()> {
        let slot = match id {
            ProviderId::Gemini => &mut self.gemini,
            ProviderId::Groq => &mut self.groq,
            ProviderId::HuggingFace => &mut self.huggingface,
            ProviderId::Zhipu => &mut self.zhipu,
            ProviderId::Local => {
                return Err(CoreError::Configuration(
                    "The local provider does not take an API key".to_string(),
                ))
            }
        };
        let key = key.trim();
        *slot = (!key.is_empty()).then(|| key.to_string());
        Ok(())
    }

    fn normalize(&mut self) {
        for slot in [
            &mut self.gemini,
            &mut self.groq,
            &mut self.huggingface,
            &mut self.zhipu,
        ] {
            if let Some(key) = slot.as_mut() {
                *key = key.trim().to_string();
            }
            if slot.as_deref().is_some_and(str::is_empty) {
                *slot = None;
            }
        }
    }
}

impl AppSettings {
    /// Clamp/normalize values to keep the settings file robust against manual edits.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        let (min, max) = FRAME_INTERVAL_RANGE;
        self.analysis.frame_interval_secs =
            clamp_f64(self.analysis.frame_interval_secs, min, max, default_frame_interval());

        let (min, max) = SEEK_TIMEOUT_RANGE_MS;
        self.analysis.seek_timeout_ms = self.analysis.seek_timeout_ms.clamp(min, max);

        self.analysis.video_quality = normalize_enum(
            &self.analysis.video_quality,
            &VIDEO_QUALITIES,
            default_video_quality(),
        );

        self.providers.normalize();
    }

    /// Pushes stored keys and the preferred provider into a registry.
    pub fn apply_to(&self, registry: &mut ProviderRegistry) -> CoreResult<()> {
        for id in ProviderId::ALL {
            if let Some(key) = self.providers.get(id) {
                registry.set_credential(id, key)?;
            }
        }
        registry.set_active(self.analysis.provider)
    }
}

fn clamp_f64(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if !value.is_finite() {
        return fallback;
    }
    value.clamp(min, max)
}

fn normalize_enum(value: &str, allowed: &[&str], fallback: String) -> String {
    if allowed.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        value.to_ascii_lowercase()
    } else {
        fallback
    }
}

// =============================================================================
// Manager
// =============================================================================

/// Loads and stores [`AppSettings`] under one directory.
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings_path: config_dir.into().join(SETTINGS_FILE),
        }
    }

    /// Platform config directory, e.g. `~/.config/wavecoach`.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wavecoach"))
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    fn lock_path(&self) -> PathBuf {
        self.settings_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(SETTINGS_LOCK_FILE)
    }

    fn with_lock<T>(&self, exclusive: bool, op: impl FnOnce() -> CoreResult<T>) -> CoreResult<T> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;

        if exclusive {
            fs2::FileExt::lock_exclusive(&lock_file)?;
        } else {
            fs2::FileExt::lock_shared(&lock_file)?;
        }

        let result = op();

        if let Err(e) = fs2::FileExt::unlock(&lock_file) {
            warn!("Failed to unlock settings lock file: {}", e);
        }

        result
    }

    /// Loads settings, returning defaults when the file is missing or unreadable.
    pub fn load(&self) -> AppSettings {
        let result = self.with_lock(false, || {
            if !self.settings_path.exists() {
                info!("Settings file not found, using defaults");
                return Ok(AppSettings::default());
            }

            let content = fs::read_to_string(&self.settings_path)?;
            let mut settings = serde_json::from_str::<AppSettings>(&content)?;
            if settings.version < SETTINGS_VERSION {
                info!(
                    "Migrating settings from version {} to {}",
                    settings.version, SETTINGS_VERSION
                );
            }
            settings.normalize();
            Ok(settings)
        });

        match result {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                AppSettings::default()
            }
        }
    }

    /// Saves normalized settings using an atomic write (temp file + rename).
    pub fn save(&self, settings: &AppSettings) -> CoreResult<AppSettings> {
        self.with_lock(true, || {
            let mut normalized = settings.clone();
            normalized.normalize();

            let content = serde_json::to_string_pretty(&normalized)?;

            let temp_path = self.settings_path.with_extension("json.tmp");
            if temp_path.exists() {
                let _ = fs::remove_file(&temp_path);
            }

            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
            drop(file);

            if cfg!(windows) && self.settings_path.exists() {
                // rename does not overwrite on Windows
                fs::remove_file(&self.settings_path)?;
            }
            fs::rename(&temp_path, &self.settings_path)?;

            info!("Settings saved to {:?}", self.settings_path);
            Ok(normalized)
        })
    }

    /// Loads, applies `edit`, and saves.
    pub fn update(
        &self,
        edit: impl FnOnce(&mut AppSettings) -> CoreResult<()>,
    ) -> CoreResult<AppSettings> {
        let mut settings = self.load();
        edit(&mut settings)?;
        self.save(&settings)
    }

    /// Deletes the settings file and returns defaults.
    pub fn reset(&self) -> CoreResult<AppSettings> {
        self.with_lock(true, || {
            if self.settings_path.exists() {
                fs::remove_file(&self.settings_path)?;
                info!("Settings file deleted");
            }
            Ok(AppSettings::default())
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
