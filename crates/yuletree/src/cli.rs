use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "yuletree",
    author,
    version,
    about = "Headless driver for the gesture-controlled tree scene"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a scene session and print snapshots as JSON lines.
    Run(RunArgs),
    /// Inspect and validate scene configuration.
    Config(ConfigCommand),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Scene configuration file; otherwise the discovered `scene.toml` or defaults.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// TOML script of timed input events to replay.
    #[arg(long, value_name = "FILE")]
    pub script: Option<PathBuf>,

    /// JSON-lines gesture samples; `-` reads stdin and runs on the wall clock.
    #[arg(long, value_name = "FILE|-")]
    pub gestures: Option<String>,

    /// Simulated frame rate.
    #[arg(long, value_name = "FPS", default_value_t = 60.0, value_parser = parse_fps)]
    pub fps: f32,

    /// Stop after this much scene time (e.g. `5s`, `1500ms`).
    #[arg(long, value_name = "DURATION", value_parser = parse_cli_duration)]
    pub duration: Option<Duration>,

    /// Override the layout and photo-subset seed from the config.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Print every Nth frame; the final frame is always printed.
    #[arg(
        long,
        value_name = "N",
        default_value_t = 1,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub every: u64,

    /// Log every gesture sample as it is consumed.
    #[arg(long)]
    pub show_camera: bool,
}

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print where configuration is looked up.
    Where,
    /// Parse and validate a configuration file.
    Check {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the effective configuration as TOML.
    Print {
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_fps(value: &str) -> Result<f32, String> {
    let trimmed = value.trim();
    let fps: f32 = trimmed
        .parse()
        .map_err(|_| format!("invalid frame rate '{trimmed}'"))?;
    if !fps.is_finite() || fps <= 0.0 {
        return Err(format!("frame rate must be positive, got {fps}"));
    }
    if fps > 1000.0 {
        return Err(format!("frame rate {fps} exceeds the supported maximum of 1000"));
    }
    Ok(fps)
}

pub fn parse_cli_duration(value: &str) -> Result<Duration, String> {
    let duration = treeconfig::parse_duration(value)?;
    if duration.is_zero() {
        return Err("duration must be greater than zero".to_string());
    }
    Ok(duration)
}
