use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_SETTINGS_FILE: &str = "hawkwatch.json";

#[derive(Parser, Debug)]
#[command(name = "hawkwatch", version, about = "Periodic camera hazard monitor")]
pub struct Cli {
    #[arg(
        long,
        default_value = DEFAULT_SETTINGS_FILE,
        help = "Settings file (JSON); missing files mean defaults"
    )]
    pub settings: PathBuf,
    #[arg(
        long,
        conflicts_with = "capture_cmd",
        help = "Directory of still images replayed as the camera"
    )]
    pub frames_dir: Option<PathBuf>,
    #[arg(long, help = "Command whose stdout is one captured image")]
    pub capture_cmd: Option<String>,
    #[arg(long, default_value = "", help = "Audio transcript passed as scene context")]
    pub transcript: String,
    #[arg(long, help = "Override the analysis period in milliseconds")]
    pub interval_ms: Option<u64>,
    #[arg(long, help = "Stop after this many cycles, skipped ones included")]
    pub cycles: Option<u64>,
    #[arg(long, help = "Write the effective settings back to the settings file")]
    pub save_settings: bool,
}
