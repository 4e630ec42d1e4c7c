mod cli;
mod error;
mod pipeline;
mod run_context;
mod source;

use anyhow::{Context, Result};
use cli::Args;
use pipeline::types::{AnalysisConfig, AnalysisKind};
use source::CaptureFile;
use std::str::FromStr;

fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args = Args::parse_args();

    if args.list {
        return list_workspace(&args);
    }

    let capture = args
        .capture
        .clone()
        .context("--capture is required unless --list is given")?;
    let capture_name = capture
        .file_name()
        .and_then(|s| s.to_str())
        .context("capture path has no file name")?
        .to_string();

    let kinds: Vec<AnalysisKind> = args
        .analyses
        .iter()
        .map(|s| AnalysisKind::from_str(s).map_err(|e| anyhow::anyhow!(e)))
        .collect::<Result<_>>()?;

    let run = run_context::create_run(&args.output_root, &capture_name)?;
    tracing::info!("run {} started for capture {:?}", run.run_id, capture);

    let config = AnalysisConfig {
        pixels_per_meter: args.pixels_per_meter,
        keypoint_confidence: args.keypoint_confidence,
    };
    let factory = CaptureFile::new(capture);

    let outputs = pipeline::orchestrator::run_requested(
        &factory,
        &kinds,
        &run.output_dir,
        &config,
        args.parallel,
    );

    let results_path = run.output_dir.join("results.json");
    std::fs::write(&results_path, serde_json::to_string_pretty(&outputs)?)?;

    tracing::info!(
        "run {} finished: {}/{} analyses succeeded, results at {:?}",
        run.run_id,
        outputs.len(),
        kinds.len(),
        results_path
    );

    Ok(())
}

fn list_workspace(args: &Args) -> Result<()> {
    if let Some(capture_root) = &args.capture_root {
        println!("captures under {:?}:", capture_root);
        for capture in run_context::list_captures(capture_root) {
            println!("  {}", capture.display());
        }
    }

    let runs = run_context::list_runs(&args.output_root)?;
    println!("runs under {:?}:", args.output_root);
    for (name, metadata) in runs {
        println!("  {name}\t{}", metadata.created_at.to_rfc3339());
    }

    Ok(())
}
