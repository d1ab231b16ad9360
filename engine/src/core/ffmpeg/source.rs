//! FFmpeg-backed video source

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;

use super::{probe, FFmpegError, FFmpegInfo, FFmpegResult, VideoProbe};
use crate::core::analysis::{EncodedImage, VideoSource};
use crate::core::{CoreError, CoreResult, TimeSec};

/// A video file read through ffprobe and single-frame ffmpeg captures.
///
/// Seeking only records the position; each capture decodes one frame there.
pub struct FfmpegVideoSource {
    info: Arc<FFmpegInfo>,
    path: PathBuf,
    probe: VideoProbe,
    position: TimeSec,
    max_height: Option<u32>,
}

impl FfmpegVideoSource {
    /// Probes `path` and opens it positioned at 0.
    pub async fn open(info: Arc<FFmpegInfo>, path: impl Into<PathBuf>) -> FFmpegResult<Self> {
        let path = path.into();
        let probe = probe(&info, &path).await?;
        tracing::info!(
            "Opened {} ({}x{}, {:?}s)",
            path.display(),
            probe.width,
            probe.height,
            probe.duration
        );
        Ok(Self {
            info,
            path,
            probe,
            position: 0.0,
            max_height: None,
        })
    }

    /// Downscales captured frames taller than `height` pixels.
    pub fn with_max_height(mut self, height: u32) -> Self {
        self.max_height = Some(height);
        self
    }

    /// Maps a quality label ("720p", "1080p", "4k") to a frame height cap.
    pub fn with_quality(self, quality: &str) -> Self {
        match quality_height(quality) {
            Some(height) => self.with_max_height(height),
            None => self,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn probe(&self) -> &VideoProbe {
        &self.probe
    }

    pub fn position(&self) -> TimeSec {
        self.position
    }

    fn capture_args(&self) -> Vec<String> {
        let mut args = vec![
            "-v".to_string(),
            "error".to_string(),
            // -ss before -i for fast seeking
            "-ss".to_string(),
            format!("{:.3}", self.position),
            "-i".to_string(),
            self.path.to_string_lossy().into_owned(),
            "-frames:v".to_string(),
            "1".to_string(),
        ];
        if let Some(height) = self.max_height {
            args.push("-vf".to_string());
            args.push(format!("scale=-2:'min({},ih)'", height));
        }
        args.extend(
            ["-f", "image2pipe", "-vcodec", "mjpeg", "-q:v", "2", "-"]
                .into_iter()
                .map(String::from),
        );
        args
    }

    async fn run_capture(&self) -> FFmpegResult<Vec<u8>> {
        let output = tokio::process::Command::new(&self.info.ffmpeg_path)
            .args(self.capture_args())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FFmpegError::ExecutionFailed(format!(
                "Frame capture at {:.3}s failed: {}",
                self.position,
                stderr.trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(FFmpegError::ExecutionFailed(format!(
                "No frame decoded at {:.3}s",
                self.position
            )));
        }
        Ok(output.stdout)
    }
}

fn quality_height(quality: &str) -> Option<u32> {
    match quality.trim().to_ascii_lowercase().as_str() {
        "720p" => Some(720),
        "1080p" => Some(1080),
        "4k" | "2160p" => Some(2160),
        _ => None,
    }
}

#[async_trait]
impl VideoSource for FfmpegVideoSource {
    async fn duration(&self) -> Option<TimeSec> {
        self.probe.duration
    }

    async fn seek(&mut self, t: TimeSec) -> CoreResult<()> {
        if !t.is_finite() || t < 0.0 {
            return Err(CoreError::InvalidInput(format!("Invalid seek position: {}", t)));
        }
        self.position = match self.probe.duration {
            Some(d) => t.min(d),
            None => t,
        };
        Ok(())
    }

    async fn capture_frame(&mut self) -> CoreResult<EncodedImage> {
        let bytes = self.run_capture().await?;
        Ok(EncodedImage::jpeg(bytes))
    }
}
