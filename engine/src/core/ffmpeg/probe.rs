//! FFprobe metadata

use std::path::Path;

use serde::Serialize;

use super::{FFmpegError, FFmpegInfo, FFmpegResult};
use crate::core::TimeSec;

/// Metadata of the first video stream of a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoProbe {
    /// `None` when the container reports no usable duration
    pub duration: Option<TimeSec>,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub codec: String,
}

/// Runs ffprobe on `input`.
pub async fn probe(info: &FFmpegInfo, input: &Path) -> FFmpegResult<VideoProbe> {
    if !input.is_file() {
        return Err(FFmpegError::InvalidInput(format!(
            "Input file does not exist: {}",
            input.display()
        )));
    }

    let output = tokio::process::Command::new(&info.ffprobe_path)
        .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(input)
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(FFmpegError::ProbeError(format!("FFprobe failed: {}", stderr.trim())));
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
}

fn parse_probe_output(json_str: &str) -> FFmpegResult<VideoProbe> {
    let json: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| FFmpegError::ParseError(format!("Failed to parse FFprobe output: {}", e)))?;

    let streams = json
        .get("streams")
        .and_then(|s| s.as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();
    let video = streams
        .iter()
        .find(|s| s.get("codec_type").and_then(|c| c.as_str()) == Some("video"))
        .ok_or_else(|| FFmpegError::ProbeError("No video stream found".to_string()))?;

    // Stream duration first, container duration as fallback
    let duration = [video.get("duration"), json.pointer("/format/duration")]
        .into_iter()
        .flatten()
        .filter_map(|d| d.as_str().and_then(|s| s.parse::<f64>().ok()))
        .find(|d| d.is_finite() && *d > 0.0);

    let dimension = |key: &str| video.get(key).and_then(|v| v.as_u64()).unwrap_or(0) as u32;

    let fps = video
        .get("r_frame_rate")
        .and_then(|f| f.as_str())
        .and_then(parse_frame_rate)
        .unwrap_or(30.0);

    Ok(VideoProbe {
        duration,
        width: dimension("width"),
        height: dimension("height"),
        fps,
        codec: video
            .get("codec_name")
            .and_then(|c| c.as_str())
            .unwrap_or("unknown")
            .to_string(),
    })
}

/// Parses "30/1", "30000/1001" or a plain number.
fn parse_frame_rate(s: &str) -> Option<f64> {
    match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            (den > 0.0).then(|| num / den)
        }
        None => s.parse().ok(),
    }
}
