//! Analysis Orchestrator
//!
//! Drives one analysis run: sample the video at a fixed interval, send every
//! frame to the active provider, decode the replies and attach annotations.
//!
//! Error policy:
//! - a provider failure aborts the whole run and is returned to the caller
//! - an undecodable reply only affects its frame, which gets the fallback result

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{
    AnalysisLevel, FrameAnalysis, FrameSample, PromptBuilder, ResponseParser, VideoSource,
};
use crate::core::annotations::{annotate, AnnotationTrack};
use crate::core::providers::{
    create_provider, ProviderConfig, ProviderId, ProviderRegistry, VisionProvider,
};
use crate::core::report::{aggregate, Report};
use crate::core::{CoreError, CoreResult, RunId, TimeSec};

// =============================================================================
// Collaborators
// =============================================================================

/// Receives `(percent, status)` once per analyzed frame.
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: f64, status: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(f64, &str) + Send + Sync,
{
    fn report(&self, percent: f64, status: &str) {
        self(percent, status)
    }
}

/// Progress sink that discards updates.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _percent: f64, _status: &str) {}
}

/// Builds the adapter for the active provider config.
pub type ProviderFactory =
    Arc<dyn Fn(ProviderConfig) -> CoreResult<Box<dyn VisionProvider>> + Send + Sync>;

// =============================================================================
// Run Result
// =============================================================================

/// Outcome of a completed run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRun {
    pub id: RunId,
    pub provider: ProviderId,
    pub provider_name: String,
    pub interval_secs: f64,
    /// One entry per sampled timestamp, in order
    pub frames: Vec<FrameAnalysis>,
    /// Indices of frames whose reply could not be decoded
    pub fallback_frames: Vec<usize>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl AnalysisRun {
    pub fn report(&self) -> Report {
        aggregate(&self.frames, &self.provider_name)
    }

    pub fn annotations(&self) -> AnnotationTrack {
        AnnotationTrack::from_frames(&self.frames)
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Upper bound on frames per run, keeps a bad interval from flooding a quota.
pub const MAX_FRAMES_PER_RUN: usize = 10_000;

/// Default wait for a seek to complete before sampling anyway.
pub const DEFAULT_SEEK_TIMEOUT: Duration = Duration::from_secs(1);

/// Runs analyses against the active provider of a shared registry.
pub struct AnalysisOrchestrator {
    registry: RwLock<ProviderRegistry>,
    factory: ProviderFactory,
    prompts: PromptBuilder,
    parser: ResponseParser,
    seek_timeout: Duration,
    busy: AtomicBool,
}

/// Clears the busy flag on every exit path.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> CoreResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| {
                CoreError::Configuration("An analysis run is already in progress".to_string())
            })?;
        Ok(Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AnalysisOrchestrator {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            registry: RwLock::new(registry),
            factory: Arc::new(create_provider),
            prompts: PromptBuilder::default(),
            parser: ResponseParser::new(),
            seek_timeout: DEFAULT_SEEK_TIMEOUT,
            busy: AtomicBool::new(false),
        }
    }

    /// Replaces how adapters are built (tests, custom transports).
    pub fn with_factory(mut self, factory: ProviderFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn with_level(mut self, level: AnalysisLevel) -> Self {
        self.prompts = PromptBuilder::new(level);
        self
    }

    pub fn with_seek_timeout(mut self, timeout: Duration) -> Self {
        self.seek_timeout = timeout;
        self
    }

    pub fn is_running(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Snapshot of the registry.
    pub async fn registry(&self) -> ProviderRegistry {
        self.registry.read().await.clone()
    }

    pub async fn available_providers(&self) -> Vec<ProviderId> {
        self.registry.read().await.available_providers()
    }

    /// Switches the active provider. Rejected while a run is in flight.
    pub async fn set_active_provider(&self, id: ProviderId) -> CoreResult<()> {
        let mut registry = self.registry.write().await;
        self.ensure_idle("switch provider")?;
        registry.set_active(id)
    }

    /// Replaces a provider credential. Rejected while a run is in flight.
    pub async fn set_credential(&self, id: ProviderId, secret: &str) -> CoreResult<()> {
        let mut registry = self.registry.write().await;
        self.ensure_idle("change credentials")?;
        registry.set_credential(id, secret)
    }

    fn ensure_idle(&self, action: &str) -> CoreResult<()> {
        if self.is_running() {
            return Err(CoreError::Configuration(format!(
                "Cannot {} while an analysis run is in progress",
                action
            )));
        }
        Ok(())
    }

    /// Analyzes `video` every `interval_secs` seconds with the active provider.
    pub async fn run<V>(
        &self,
        video: &mut V,
        interval_secs: f64,
        progress: &dyn ProgressSink,
    ) -> CoreResult<AnalysisRun>
    where
        V: VideoSource + ?Sized,
    {
        let _guard = RunGuard::acquire(&self.busy)?;
        let started_at = Utc::now();

        let duration = video.duration().await.ok_or_else(|| {
            CoreError::InvalidInput("Video duration is not known".to_string())
        })?;
        let timestamps = frame_timestamps(duration, interval_secs)?;

        let config = self.registry.read().await.validate_active()?.clone();
        let provider_id = config.id;
        let provider_name = config.name.clone();
        let provider = (self.factory)(config)?;

        let total = timestamps.len();
        tracing::info!(
            "Starting analysis: {} frames every {:.2}s over {:.2}s with {}",
            total,
            interval_secs,
            duration,
            provider_name
        );

        let mut frames = Vec::with_capacity(total);
        let mut fallback_frames = Vec::new();

        for (index, &timestamp) in timestamps.iter().enumerate() {
            self.seek_bounded(video, timestamp).await;

            let image = video.capture_frame().await.map_err(|e| match e {
                CoreError::InvalidInput(_) => e,
                other => CoreError::InvalidInput(format!(
                    "Failed to capture frame at {:.2}s: {}",
                    timestamp, other
                )),
            })?;

            let sample = FrameSample {
                timestamp,
                image,
                index,
                total,
            };
            let prompt = self.prompts.build(timestamp);

            let raw = provider.analyze(&sample, &prompt).await.map_err(|e| {
                tracing::error!("Analysis aborted at frame {}/{}: {}", index + 1, total, e);
                e
            })?;
            drop(sample);

            let mut analysis = match self.parser.try_parse(&raw, timestamp) {
                Ok(analysis) => analysis,
                Err(e) => {
                    tracing::warn!(
                        "Frame {} at {:.2}s uses fallback analysis: {}",
                        index,
                        timestamp,
                        e
                    );
                    fallback_frames.push(index);
                    FrameAnalysis::fallback(timestamp)
                }
            };
            annotate(&mut analysis);
            tracing::debug!(
                "Frame {} at {:.2}s: {} ({} annotations)",
                index,
                timestamp,
                analysis.current_action,
                analysis.annotations.len()
            );
            frames.push(analysis);

            let done = index + 1;
            progress.report(
                done as f64 / total as f64 * 100.0,
                &format!("Analyzing frame {}/{}...", done, total),
            );
        }

        tracing::info!(
            "Analysis finished: {} frames, {} fallback",
            frames.len(),
            fallback_frames.len()
        );

        Ok(AnalysisRun {
            id: ulid::Ulid::new().to_string(),
            provider: provider_id,
            provider_name,
            interval_secs,
            frames,
            fallback_frames,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Seeks with a bounded wait. On timeout or seek failure the currently
    /// displayed frame is used.
    async fn seek_bounded<V>(&self, video: &mut V, timestamp: TimeSec)
    where
        V: VideoSource + ?Sized,
    {
        match tokio::time::timeout(self.seek_timeout, video.seek(timestamp)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!("Seek to {:.2}s failed, sampling current frame: {}", timestamp, e)
            }
            Err(_) => tracing::warn!(
                "Seek to {:.2}s did not complete within {:?}, sampling current frame",
                timestamp,
                self.seek_timeout
            ),
        }
    }
}

/// Sampling timestamps `i * interval` for `i in [0, ceil(duration / interval))`.
pub fn frame_timestamps(duration: TimeSec, interval_secs: f64) -> CoreResult<Vec<TimeSec>> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(CoreError::InvalidInput(format!(
            "Video duration must be positive, got {}",
            duration
        )));
    }
    if !interval_secs.is_finite() || interval_secs <= 0.0 {
        return Err(CoreError::InvalidInput(format!(
            "Frame interval must be positive, got {}",
            interval_secs
        )));
    }

    // Absorb float noise such as 1.1 / 0.1 = 11.000000000000002.
    let count = (duration / interval_secs - 1e-9).ceil().max(1.0);
    if count > MAX_FRAMES_PER_RUN as f64 {
        return Err(CoreError::InvalidInput(format!(
            "Interval {}s yields {} frames, limit is {}",
            interval_secs, count, MAX_FRAMES_PER_RUN
        )));
    }

    Ok((0..count as usize)
        .map(|i| i as f64 * interval_secs)
        .collect())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::core::analysis::video::StaticVideo;
    use crate::core::analysis::SurfAction;
    use crate::core::providers::{MockReply, MockVisionProvider};

    fn keyed_registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::with_defaults();
        registry.set_credential(ProviderId::Gemini, "test-key").unwrap();
        registry
    }

    fn orchestrator_with(mock: Arc<MockVisionProvider>) -> AnalysisOrchestrator {
        AnalysisOrchestrator::new(keyed_registry()).with_factory(Arc::new(
            move |_config: ProviderConfig| Ok(Box::new(mock.clone()) as Box<dyn VisionProvider>),
        ))
    }

    // -------------------------------------------------------------------------
    // Frame sampling
    // -------------------------------------------------------------------------

    #[test]
    fn test_frame_timestamps_count_and_spacing() {
        let cases = [
            (10.0, 2.0, 5),
            (10.0, 3.0, 4),
            (1.0, 2.0, 1),
            (1.1, 0.1, 11),
            (7.5, 0.5, 15),
        ];
        for (duration, interval, expected) in cases {
            let ts = frame_timestamps(duration, interval).unwrap();
            assert_eq!(ts.len(), expected, "D={} I={}", duration, interval);
            assert_eq!(ts[0], 0.0);
            assert!(ts.windows(2).all(|w| w[1] > w[0]));
            assert!(ts.iter().all(|t| *t < duration + interval));
            assert!(ts.iter().all(|t| *t < duration));
        }
    }

    #[test]
    fn test_frame_timestamps_rejects_bad_input() {
        let cases = [
            (0.0, 1.0),
            (-3.0, 1.0),
            (f64::NAN, 1.0),
            (10.0, 0.0),
            (10.0, -1.0),
            (1e9, 0.001),
        ];
        for (d, i) in cases {
            let err = frame_timestamps(d, i).unwrap_err();
            assert!(matches!(err, CoreError::InvalidInput(_)));
        }
    }

    // -------------------------------------------------------------------------
    // Successful runs
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_run_produces_one_result_per_timestamp() {
        let mock = Arc::new(MockVisionProvider::new(ProviderId::Gemini));
        let orchestrator = orchestrator_with(mock.clone());
        let mut video = StaticVideo::new(Some(9.0));

        let run = orchestrator.run(&mut video, 2.0, &NoProgress).await.unwrap();

        assert_eq!(run.frames.len(), 5);
        let stamps: Vec<f64> = run.frames.iter().map(|f| f.timestamp).collect();
        assert_eq!(stamps, vec![0.0, 2.0, 4.0, 6.0, 8.0]);
        assert_eq!(mock.seen_timestamps(), stamps);
        assert_eq!(video.seeks, stamps);
        assert!(run.fallback_frames.is_empty());
        assert!(run.frames.iter().all(|f| f.current_action == SurfAction::Turn));
        assert!(run.frames.iter().all(|f| !f.annotations.is_empty()));
        assert_eq!(run.provider, ProviderId::Gemini);
        assert_eq!(run.provider_name, "Google Gemini");
        assert!(!orchestrator.is_running());
    }

    #[tokio::test]
    async fn test_progress_reported_once_per_frame() {
        let mock = Arc::new(MockVisionProvider::new(ProviderId::Gemini));
        let orchestrator = orchestrator_with(mock);
        let mut video = StaticVideo::new(Some(4.0));
        let updates: Mutex<Vec<(f64, String)>> = Mutex::new(Vec::new());
        let sink = |percent: f64, status: &str| {
            updates.lock().unwrap().push((percent, status.to_string()));
        };

        orchestrator.run(&mut video, 1.0, &sink).await.unwrap();

        let updates = updates.into_inner().unwrap();
        let percents: Vec<f64> = updates.iter().map(|(p, _)| *p).collect();
        assert_eq!(percents, vec![25.0, 50.0, 75.0, 100.0]);
        assert_eq!(updates[0].1, "Analyzing frame 1/4...");
        assert_eq!(updates[3].1, "Analyzing frame 4/4...");
    }

    // -------------------------------------------------------------------------
    // Failure policy
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_provider_failure_aborts_run() {
        let mock = Arc::new(
            MockVisionProvider::new(ProviderId::Gemini)
                .then(MockReply::Text(MockVisionProvider::SAMPLE_RESPONSE.into()))
                .then(MockReply::Failure(429, "quota exceeded".into())),
        );
        let orchestrator = orchestrator_with(mock.clone());
        let mut video = StaticVideo::new(Some(10.0));
        let reported = Mutex::new(0usize);
        let sink = |_: f64, _: &str| *reported.lock().unwrap() += 1;

        let err = orchestrator.run(&mut video, 2.0, &sink).await.unwrap_err();

        match err {
            CoreError::Provider {
                provider,
                status,
                message,
            } => {
                assert_eq!(provider, ProviderId::Gemini);
                assert_eq!(status, Some(429));
                assert_eq!(message, "quota exceeded");
            }
            other => panic!("expected provider error, got {:?}", other),
        }
        assert_eq!(mock.call_count(), 2);
        assert_eq!(*reported.lock().unwrap(), 1);
        assert!(!orchestrator.is_running());
    }

    #[tokio::test]
    async fn test_parse_failure_uses_fallback_and_continues() {
        let mock = Arc::new(
            MockVisionProvider::new(ProviderId::Gemini)
                .then(MockReply::Text(MockVisionProvider::SAMPLE_RESPONSE.into()))
                .then(MockReply::Text("Sorry, I can't see a surfer here.".into())),
        );
        let orchestrator = orchestrator_with(mock.clone());
        let mut video = StaticVideo::new(Some(6.0));

        let run = orchestrator.run(&mut video, 2.0, &NoProgress).await.unwrap();

        assert_eq!(run.frames.len(), 3);
        assert_eq!(run.fallback_frames, vec![1]);
        let mut expected = FrameAnalysis::fallback(2.0);
        annotate(&mut expected);
        assert_eq!(run.frames[1], expected);
        assert_eq!(run.frames[0].current_action, SurfAction::Turn);
        assert_eq!(run.frames[2].current_action, SurfAction::Turn);
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_unknown_duration_is_invalid_input() {
        let mock = Arc::new(MockVisionProvider::new(ProviderId::Gemini));
        let orchestrator = orchestrator_with(mock.clone());

        let err = orchestrator
            .run(&mut StaticVideo::new(None), 2.0, &NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));

        let err = orchestrator
            .run(&mut StaticVideo::new(Some(0.0)), 2.0, &NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_is_configuration_error() {
        let orchestrator = AnalysisOrchestrator::new(ProviderRegistry::with_defaults());
        let err = orchestrator
            .run(&mut StaticVideo::new(Some(4.0)), 2.0, &NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_text_only_provider_is_configuration_error() {
        let mut registry = ProviderRegistry::with_defaults();
        registry.set_credential(ProviderId::Groq, "k").unwrap();
        registry.set_active(ProviderId::Groq).unwrap();
        let orchestrator = AnalysisOrchestrator::new(registry);

        let err = orchestrator
            .run(&mut StaticVideo::new(Some(4.0)), 2.0, &NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_capture_failure_aborts_as_invalid_input() {
        let mock = Arc::new(MockVisionProvider::new(ProviderId::Gemini));
        let orchestrator = orchestrator_with(mock.clone());
        let mut video = StaticVideo::new(Some(6.0));
        video.fail_capture_at = Some(2.0);

        let err = orchestrator.run(&mut video, 2.0, &NoProgress).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
        assert_eq!(mock.call_count(), 1);
    }

    // -------------------------------------------------------------------------
    // Seek timeout
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_stalled_seek_proceeds_after_timeout() {
        let mock = Arc::new(MockVisionProvider::new(ProviderId::Gemini));
        let orchestrator =
            orchestrator_with(mock.clone()).with_seek_timeout(Duration::from_millis(10));
        let mut video = StaticVideo::new(Some(4.0));
        video.seek_delay = Some(Duration::from_millis(300));

        let run = orchestrator.run(&mut video, 2.0, &NoProgress).await.unwrap();

        assert_eq!(run.frames.len(), 2);
        assert_eq!(video.seeks, vec![0.0, 2.0]);
        // Seeks never completed, the displayed frame stayed put.
        assert_eq!(video.position, 0.0);
    }

    // -------------------------------------------------------------------------
    // Concurrency
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_second_run_and_provider_switch_rejected_while_busy() {
        let mock = Arc::new(
            MockVisionProvider::new(ProviderId::Gemini).with_delay(Duration::from_millis(100)),
        );
        let orchestrator = Arc::new(orchestrator_with(mock));

        let background = orchestrator.clone();
        let first = tokio::spawn(async move {
            let mut video = StaticVideo::new(Some(6.0));
            background.run(&mut video, 2.0, &NoProgress).await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(orchestrator.is_running());

        let err = orchestrator
            .run(&mut StaticVideo::new(Some(2.0)), 1.0, &NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));

        let err = orchestrator
            .set_active_provider(ProviderId::Zhipu)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));

        let run = first.await.unwrap().unwrap();
        assert_eq!(run.frames.len(), 3);
        assert!(!orchestrator.is_running());

        orchestrator.set_active_provider(ProviderId::Zhipu).await.unwrap();
        assert_eq!(orchestrator.registry().await.active_id(), ProviderId::Zhipu);
    }

    #[tokio::test]
    async fn test_orchestrator_resumable_after_failure() {
        let mock = Arc::new(
            MockVisionProvider::new(ProviderId::Gemini)
                .then(MockReply::Failure(500, "internal".into())),
        );
        let orchestrator = orchestrator_with(mock);
        let mut video = StaticVideo::new(Some(4.0));

        assert!(orchestrator.run(&mut video, 2.0, &NoProgress).await.is_err());
        let run = orchestrator.run(&mut video, 2.0, &NoProgress).await.unwrap();
        assert_eq!(run.frames.len(), 2);
    }

    #[tokio::test]
    async fn test_run_with_local_provider_end_to_end() {
        let mut registry = ProviderRegistry::with_defaults();
        registry.set_active(ProviderId::Local).unwrap();
        let orchestrator = AnalysisOrchestrator::new(registry);
        let mut video = StaticVideo::new(Some(20.0));

        let run = orchestrator.run(&mut video, 2.0, &NoProgress).await.unwrap();
        assert_eq!(run.frames.len(), 10);
        assert!(run.fallback_frames.is_empty());
        assert_eq!(run.frames[0].current_action, SurfAction::Takeoff);
        assert_eq!(run.frames[9].current_action, SurfAction::Cutback);

        let report = run.report();
        assert_eq!(report.total_frames, 10);
        assert_eq!(report.provider_name, "Local Coach");
        assert!(!run.annotations().is_empty());
    }
}
