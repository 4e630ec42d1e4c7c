use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Capture file (JSONL) holding the recognition model's per-frame output
    #[arg(long)]
    pub capture: Option<PathBuf>,

    /// Root directory scanned for capture files
    #[arg(long, env = "MATCHSIGHT_CAPTURE_ROOT")]
    pub capture_root: Option<PathBuf>,

    /// Root directory for run output artifacts
    #[arg(long, env = "MATCHSIGHT_OUTPUT_ROOT")]
    pub output_root: PathBuf,

    /// Analyses to run over the capture
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "tracking,heatmap,pose,shot,speed"
    )]
    pub analyses: Vec<String>,

    /// Pixel-to-meter calibration constant
    #[arg(long, default_value_t = 50.0)]
    pub pixels_per_meter: f32,

    /// Minimum per-keypoint confidence for a landmark to count as observed
    #[arg(long, default_value_t = 0.25)]
    pub keypoint_confidence: f32,

    /// Run the requested analyses on separate threads
    #[arg(long)]
    pub parallel: bool,

    /// List available captures and existing runs, then exit
    #[arg(long)]
    pub list: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
