//! Command-line interface for wakegate
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Wake-phrase gated voice capture front-end
#[derive(Parser, Debug)]
#[command(name = "wakegate", version, about = "Wake-phrase gated voice capture")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Audio input device (e.g., hw:1)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Directory of prepared reference recordings
    #[arg(long, value_name = "DIR")]
    pub templates: Option<PathBuf>,

    /// Wake detection threshold (distance; smaller is stricter)
    #[arg(long, value_name = "DISTANCE")]
    pub threshold: Option<f32>,

    /// Maximum utterance duration. Examples: 5s, 1m30s, 500ms
    #[arg(long, value_name = "DURATION", value_parser = parse_secs)]
    pub max_duration: Option<f32>,

    /// Silence duration that ends a recording. Examples: 1500ms, 2s
    #[arg(long, value_name = "DURATION", value_parser = parse_secs)]
    pub silence: Option<f32>,

    /// Exit after the first captured utterance (default: keep listening)
    #[arg(long)]
    pub once: bool,
}

/// Parse a duration string into fractional seconds.
///
/// Supports any format accepted by `humantime`: bare numbers (seconds),
/// single-unit (`500ms`, `2s`), and compound (`1m30s`).
fn parse_secs(s: &str) -> Result<f32, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<f32>() {
        return Ok(secs);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs_f32())
        .map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio input devices
    Devices,

    /// Show per-step wake distances instead of triggering (threshold tuning)
    Monitor,

    /// Resample and length-normalize raw reference recordings
    Prepare {
        /// Directory of raw recordings
        #[arg(long, value_name = "DIR", default_value = "./voice_examples")]
        input: PathBuf,

        /// Directory prepared recordings are written into
        #[arg(long, value_name = "DIR", default_value = "./voice_examples_16k")]
        output: PathBuf,

        /// Uniform duration for prepared recordings. Examples: 2.5, 2500ms
        #[arg(long, value_name = "DURATION", default_value_t = crate::defaults::REFERENCE_SECS, value_parser = parse_secs)]
        duration: f32,
    },
}
