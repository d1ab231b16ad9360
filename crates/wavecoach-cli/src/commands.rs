//! Command handlers

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;
use wavecoach_lib::core::analysis::{
    AnalysisLevel, AnalysisOrchestrator, AnalysisRun, FrameAnalysis,
};
use wavecoach_lib::core::ffmpeg::{detect_system_ffmpeg, FfmpegVideoSource};
use wavecoach_lib::core::providers::ProviderRegistry;
use wavecoach_lib::core::render::{
    AnnotationRenderer, CanvasTarget, OverlayLayer, RecordingCanvas,
};
use wavecoach_lib::core::report::aggregate;
use wavecoach_lib::core::settings::{AppSettings, SettingsManager};
use wavecoach_lib::core::ProviderId;

use crate::{ConfigAction, OverlayMode};

#[derive(Debug, Error)]
enum CliError {
    #[error("No config directory available; pass --config-dir")]
    NoConfigDir,

    #[error("{0} is neither a saved run nor a list of frame analyses")]
    NotAFramesFile(String),

    #[error("Invalid frame interval: {0}")]
    InvalidInterval(f64),
}

/// A saved run, or the bare frame list taken from one.
#[derive(Deserialize)]
#[serde(untagged)]
enum FramesFile {
    Run(Box<AnalysisRun>),
    Frames(Vec<FrameAnalysis>),
}

impl FramesFile {
    fn into_frames(self) -> Vec<FrameAnalysis> {
        match self {
            FramesFile::Run(run) => run.frames,
            FramesFile::Frames(frames) => frames,
        }
    }
}

pub(crate) fn settings_manager(config_dir: Option<PathBuf>) -> anyhow::Result<SettingsManager> {
    let dir = config_dir
        .or_else(SettingsManager::default_dir)
        .ok_or(CliError::NoConfigDir)?;
    Ok(SettingsManager::new(dir))
}

/// Environment variable holding the key of `id`, e.g. `WAVECOACH_GEMINI_API_KEY`.
fn key_env_var(id: ProviderId) -> String {
    format!("WAVECOACH_{}_API_KEY", id.as_str().to_ascii_uppercase())
}

/// Registry from saved settings plus `WAVECOACH_<PROVIDER>_API_KEY` overrides.
fn load_registry(settings: &AppSettings) -> anyhow::Result<ProviderRegistry> {
    let mut registry = ProviderRegistry::with_defaults();
    settings.apply_to(&mut registry)?;
    for id in ProviderId::ALL {
        if let Ok(key) = std::env::var(key_env_var(id)) {
            if !key.trim().is_empty() {
                tracing::debug!("Using {} key from environment", id);
                registry.set_credential(id, &key)?;
            }
        }
    }
    Ok(registry)
}

fn read_frames(path: &Path) -> anyhow::Result<Vec<FrameAnalysis>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: FramesFile = serde_json::from_str(&content)
        .map_err(|_| CliError::NotAFramesFile(path.display().to_string()))?;
    Ok(file.into_frames())
}

fn write_json(path: &Path, value: &impl serde::Serialize) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// analyze
// =============================================================================

pub(crate) struct AnalyzeArgs {
    pub video: PathBuf,
    pub provider: Option<ProviderId>,
    pub interval: Option<f64>,
    pub api_key: Option<String>,
    pub level: Option<AnalysisLevel>,
    pub report_path: Option<PathBuf>,
    pub frames_path: Option<PathBuf>,
}

pub(crate) async fn analyze(manager: &SettingsManager, args: AnalyzeArgs) -> anyhow::Result<()> {
    let settings = manager.load();
    let mut registry = load_registry(&settings)?;
    if let Some(provider) = args.provider {
        registry.set_active(provider)?;
    }
    if let Some(key) = args.api_key.as_deref() {
        registry.set_credential(registry.active_id(), key)?;
    }

    let interval = args.interval.unwrap_or(settings.analysis.frame_interval_secs);
    if !interval.is_finite() || interval <= 0.0 {
        return Err(CliError::InvalidInterval(interval).into());
    }

    let ffmpeg = Arc::new(detect_system_ffmpeg().await?);
    let mut video = FfmpegVideoSource::open(ffmpeg, &args.video)
        .await
        .with_context(|| format!("Failed to open {}", args.video.display()))?
        .with_quality(&settings.analysis.video_quality);

    let orchestrator = AnalysisOrchestrator::new(registry)
        .with_level(args.level.unwrap_or(settings.analysis.analysis_level))
        .with_seek_timeout(Duration::from_millis(settings.analysis.seek_timeout_ms));

    let progress = |percent: f64, status: &str| {
        eprintln!("[{:>5.1}%] {}", percent, status);
    };
    let run = orchestrator.run(&mut video, interval, &progress).await?;

    if !run.fallback_frames.is_empty() {
        eprintln!(
            "{} of {} frames could not be decoded and use the default analysis",
            run.fallback_frames.len(),
            run.frames.len()
        );
    }

    let report = run.report();
    if let Some(path) = args.frames_path.as_deref() {
        write_json(path, &run)?;
    }
    if let Some(path) = args.report_path.as_deref() {
        write_json(path, &report)?;
    }
    print_json(&report)
}

// =============================================================================
// report / overlay
// =============================================================================

pub(crate) fn report(frames_path: &Path, provider_name: &str) -> anyhow::Result<()> {
    let frames = read_frames(frames_path)?;
    print_json(&aggregate(&frames, provider_name))
}

pub(crate) fn overlay(
    frames_path: &Path,
    at: f64,
    width: f64,
    height: f64,
    mode: OverlayMode,
) -> anyhow::Result<()> {
    let frames = read_frames(frames_path)?;
    let renderer = AnnotationRenderer::new();
    renderer.set_annotations(
        wavecoach_lib::core::annotations::AnnotationTrack::from_frames(&frames).into_vec(),
    );

    match mode {
        OverlayMode::Canvas => {
            let mut target = CanvasTarget::new(RecordingCanvas::new(width, height));
            renderer.render(&mut target, at);
            print_json(&target.into_inner().take_commands())
        }
        OverlayMode::Dom => {
            let mut layer = OverlayLayer::new();
            renderer.render(&mut layer, at);
            print_json(&layer.elements())
        }
    }
}

// =============================================================================
// providers / config
// =============================================================================

pub(crate) fn providers(manager: &SettingsManager) -> anyhow::Result<()> {
    let registry = load_registry(&manager.load())?;
    print_json(&registry.statuses())
}

pub(crate) fn config(manager: &SettingsManager, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let mut settings = manager.load();
            for id in ProviderId::ALL {
                if let Some(masked) = settings.providers.get(id).map(mask_key) {
                    settings.providers.set(id, &masked)?;
                }
            }
            print_json(&settings)
        }
        ConfigAction::SetKey { provider, key } => {
            let saved = manager.update(|s| s.providers.set(provider, &key))?;
            let state = if saved.providers.get(provider).is_some() {
                "saved"
            } else {
                "cleared"
            };
            eprintln!("{} API key {}", provider, state);
            Ok(())
        }
        ConfigAction::Use { provider } => {
            manager.update(|s| {
                s.analysis.provider = provider;
                Ok(())
            })?;
            eprintln!("Default provider set to {}", provider);
            Ok(())
        }
        ConfigAction::Reset => {
            manager.reset()?;
            eprintln!("Settings reset to defaults");
            Ok(())
        }
    }
}

/// Keeps the last four characters of a key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}
