//! FFmpeg Detection
//!
//! Locates `ffmpeg`/`ffprobe` and reads the installed version.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::{FFmpegError, FFmpegResult};

/// Overrides the directory searched first for both binaries.
pub const FFMPEG_DIR_ENV: &str = "WAVECOACH_FFMPEG_DIR";

/// A usable FFmpeg installation.
#[derive(Debug, Clone)]
pub struct FFmpegInfo {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    /// Version string, e.g. "6.1.1"
    pub version: String,
}

/// Finds FFmpeg in `$WAVECOACH_FFMPEG_DIR`, then PATH, then common install
/// locations, and checks it runs.
pub async fn detect_system_ffmpeg() -> FFmpegResult<FFmpegInfo> {
    let dirs = search_dirs(
        std::env::var_os(FFMPEG_DIR_ENV),
        std::env::var_os("PATH"),
    );
    let ffmpeg_path = find_binary(&dirs, "ffmpeg").ok_or(FFmpegError::NotFound)?;
    let ffprobe_path = find_binary(&dirs, "ffprobe").ok_or(FFmpegError::NotFound)?;

    let version = ffmpeg_version(&ffmpeg_path).await?;
    tracing::debug!("Found FFmpeg {} at {}", version, ffmpeg_path.display());

    Ok(FFmpegInfo {
        ffmpeg_path,
        ffprobe_path,
        version,
    })
}

/// Ordered directories to look in: override, PATH entries, platform defaults.
fn search_dirs(override_dir: Option<OsString>, path_var: Option<OsString>) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(dir) = override_dir.filter(|d| !d.is_empty()) {
        dirs.push(PathBuf::from(dir));
    }
    if let Some(path_var) = path_var {
        dirs.extend(std::env::split_paths(&path_var));
    }
    dirs.extend(common_ffmpeg_paths());
    dirs
}

fn find_binary(dirs: &[PathBuf], name: &str) -> Option<PathBuf> {
    let file_name = if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    };
    dirs.iter()
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.is_file())
}

fn common_ffmpeg_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    #[cfg(target_os = "windows")]
    {
        paths.push(PathBuf::from(r"C:\ffmpeg\bin"));
        paths.push(PathBuf::from(r"C:\Program Files\ffmpeg\bin"));
        if let Ok(programdata) = std::env::var("ProgramData") {
            paths.push(PathBuf::from(programdata).join("chocolatey").join("bin"));
        }
        if let Ok(userprofile) = std::env::var("USERPROFILE") {
            paths.push(PathBuf::from(userprofile).join("scoop").join("shims"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        paths.push(PathBuf::from("/opt/homebrew/bin"));
        paths.push(PathBuf::from("/usr/local/bin"));
        paths.push(PathBuf::from("/opt/local/bin"));
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        paths.push(PathBuf::from("/usr/bin"));
        paths.push(PathBuf::from("/usr/local/bin"));
        paths.push(PathBuf::from("/snap/bin"));
    }

    paths
}

async fn ffmpeg_version(ffmpeg_path: &Path) -> FFmpegResult<String> {
    let output = tokio::process::Command::new(ffmpeg_path)
        .arg("-version")
        .output()
        .await?;

    if !output.status.success() {
        return Err(FFmpegError::ExecutionFailed(
            "FFmpeg binary is not functional".to_string(),
        ));
    }

    parse_version(&String::from_utf8_lossy(&output.stdout))
}

/// Reads the version from the first line: "ffmpeg version X.Y.Z ...".
fn parse_version(stdout: &str) -> FFmpegResult<String> {
    let first_line = stdout
        .lines()
        .next()
        .filter(|l| !l.trim().is_empty())
        .ok_or_else(|| FFmpegError::ParseError("Could not parse FFmpeg version".to_string()))?;

    Ok(first_line
        .strip_prefix("ffmpeg version ")
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or(first_line)
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_version() {
        let out = "ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023\nbuilt with gcc";
        assert_eq!(parse_version(out).unwrap(), "6.1.1-3ubuntu5");
        assert_eq!(parse_version("custom build").unwrap(), "custom build");
        assert!(matches!(parse_version(""), Err(FFmpegError::ParseError(_))));
    }

    #[test]
    fn test_override_dir_searched_first() {
        let dirs = search_dirs(
            Some(OsString::from("/opt/ffmpeg")),
            std::env::join_paths(["/a", "/b"]).ok(),
        );
        assert_eq!(dirs[0], PathBuf::from("/opt/ffmpeg"));
        assert_eq!(dirs[1], PathBuf::from("/a"));
        assert_eq!(dirs[2], PathBuf::from("/b"));
        assert!(dirs.len() > 3);
    }

    #[test]
    fn test_find_binary_in_dir() {
        let dir = TempDir::new().unwrap();
        let name = if cfg!(windows) { "ffprobe.exe" } else { "ffprobe" };
        std::fs::write(dir.path().join(name), b"").unwrap();

        let dirs = vec![PathBuf::from("/definitely/missing"), dir.path().to_path_buf()];
        assert_eq!(find_binary(&dirs, "ffprobe"), Some(dir.path().join(name)));
        assert_eq!(find_binary(&dirs[..1], "ffprobe"), None);
    }

    #[tokio::test]
    async fn test_detect_system_ffmpeg() {
        // Passes whether or not FFmpeg is installed
        match detect_system_ffmpeg().await {
            Ok(info) => assert!(!info.version.is_empty()),
            Err(FFmpegError::NotFound) => {}
            Err(e) => panic!("Unexpected error: {}", e),
        }
    }
}
