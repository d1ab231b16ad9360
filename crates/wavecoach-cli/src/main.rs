//! WaveCoach CLI
//!
//! Headless front end for the analysis engine: analyze a video with FFmpeg,
//! rebuild reports from saved frames, render annotation overlays and manage
//! provider settings.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use wavecoach_lib::core::analysis::AnalysisLevel;
use wavecoach_lib::core::logging::init_logging;
use wavecoach_lib::core::ProviderId;

#[derive(Debug, Parser)]
#[command(name = "wavecoach", version, about = "Frame-by-frame surf video coaching")]
struct Cli {
    /// Directory holding settings.json (defaults to the platform config dir)
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Also write daily-rolling logs into this directory
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sample a video, analyze every frame and print the report
    Analyze {
        video: PathBuf,
        /// Provider for this run (overrides the saved choice)
        #[arg(long)]
        provider: Option<ProviderId>,
        /// Seconds between sampled frames
        #[arg(long)]
        interval: Option<f64>,
        /// API key for this run only
        #[arg(long)]
        api_key: Option<String>,
        /// simple, standard or detailed
        #[arg(long)]
        level: Option<AnalysisLevel>,
        /// Write the report JSON to a file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
        /// Write the full run (frames included) to a file
        #[arg(long, value_name = "FILE")]
        frames: Option<PathBuf>,
    },
    /// Rebuild a report from a saved run or frame list
    Report {
        frames: PathBuf,
        #[arg(long, default_value = "saved run")]
        provider_name: String,
    },
    /// Print the annotations drawn at a playback time
    Overlay {
        frames: PathBuf,
        /// Playback time in seconds
        #[arg(long)]
        at: f64,
        #[arg(long, default_value_t = 1280.0)]
        width: f64,
        #[arg(long, default_value_t = 720.0)]
        height: f64,
        #[arg(long, value_enum, default_value_t = OverlayMode::Canvas)]
        mode: OverlayMode,
    },
    /// List providers and whether they are ready to use
    Providers,
    /// Show or change saved settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print settings with API keys masked
    Show,
    /// Store an API key (an empty key clears it)
    SetKey { provider: ProviderId, key: String },
    /// Make a provider the default
    Use { provider: ProviderId },
    /// Delete saved settings
    Reset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OverlayMode {
    /// Draw commands for a composited canvas
    Canvas,
    /// Positioned overlay elements
    Dom,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    init_logging(cli.log_dir.as_deref(), level);

    let settings = commands::settings_manager(cli.config_dir)?;

    match cli.command {
        Command::Analyze {
            video,
            provider,
            interval,
            api_key,
            level,
            report,
            frames,
        } => {
            commands::analyze(
                &settings,
                commands::AnalyzeArgs {
                    video,
                    provider,
                    interval,
                    api_key,
                    level,
                    report_path: report,
                    frames_path: frames,
                },
            )
            .await
        }
        Command::Report {
            frames,
            provider_name,
        } => commands::report(&frames, &provider_name),
        Command::Overlay {
            frames,
            at,
            width,
            height,
            mode,
        } => commands::overlay(&frames, at, width, height, mode),
        Command::Providers => commands::providers(&settings),
        Command::Config { action } => commands::config(&settings, action),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "wavecoach",
            "-v",
            "analyze",
            "ride.mp4",
            "--provider",
            "hf",
            "--interval",
            "1.5",
            "--level",
            "simple",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Analyze {
                video,
                provider,
                interval,
                level,
                ..
            } => {
                assert_eq!(video, PathBuf::from("ride.mp4"));
                assert_eq!(provider, Some(ProviderId::HuggingFace));
                assert_eq!(interval, Some(1.5));
                assert_eq!(level, Some(AnalysisLevel::Simple));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_overlay_and_config() {
        let cli = Cli::try_parse_from([
            "wavecoach", "overlay", "run.json", "--at", "4", "--mode", "dom",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Overlay { mode: OverlayMode::Dom, width, .. } if width == 1280.0
        ));

        let cli = Cli::try_parse_from(["wavecoach", "config", "use", "glm"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Use {
                    provider: ProviderId::Zhipu
                }
            }
        ));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        assert!(Cli::try_parse_from(["wavecoach", "config", "use", "openai"]).is_err());
    }
}
