// Run aggregator: dispatches the requested analyses over one capture.
//
// Every analysis owns disjoint per-run state and reads the capture through
// its own source instance, so analyses can run in parallel with each other
// while frames within an analysis stay strictly sequential.

use crate::error::AnalysisError;
use crate::pipeline::angles::pose_analysis;
use crate::pipeline::heatmap::heatmap_analysis;
use crate::pipeline::kinematics::speed_analysis;
use crate::pipeline::shot::shot_analysis;
use crate::pipeline::tracker::tracking_analysis;
use crate::pipeline::types::{AnalysisConfig, AnalysisKind, AnalysisOutput, CaptureInfo, FrameObservations};
use crate::source::{FrameSource, SourceFactory};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::thread;

/// Run the requested analyses and collect the successful results, in request
/// order. A failed analysis is logged and omitted; its siblings always run
/// to completion.
pub fn run_requested(
    factory: &dyn SourceFactory,
    kinds: &[AnalysisKind],
    out_dir: &Path,
    config: &AnalysisConfig,
    parallel: bool,
) -> Vec<AnalysisOutput> {
    let results: Vec<(AnalysisKind, Result<AnalysisOutput, AnalysisError>)> = if parallel {
        run_parallel(factory, kinds, out_dir, config)
    } else {
        kinds
            .iter()
            .map(|&kind| (kind, run_single(kind, factory, out_dir, config, true)))
            .collect()
    };

    let mut outputs = Vec::with_capacity(results.len());
    for &kind in kinds {
        let Some((_, result)) = results.iter().find(|(k, _)| *k == kind) else {
            continue;
        };
        match result {
            Ok(output) => outputs.push(output.clone()),
            Err(e) => tracing::error!("{} failed: {e}", kind.display_name()),
        }
    }
    outputs
}

fn run_parallel(
    factory: &dyn SourceFactory,
    kinds: &[AnalysisKind],
    out_dir: &Path,
    config: &AnalysisConfig,
) -> Vec<(AnalysisKind, Result<AnalysisOutput, AnalysisError>)> {
    let (tx, rx) = crossbeam::channel::unbounded();

    thread::scope(|s| {
        for &kind in kinds {
            let tx = tx.clone();
            s.spawn(move || {
                tracing::info!("starting {} worker", kind.display_name());
                let result = run_single(kind, factory, out_dir, config, false);
                let _ = tx.send((kind, result));
            });
        }
        drop(tx);
    });

    rx.try_iter().collect()
}

fn run_single(
    kind: AnalysisKind,
    factory: &dyn SourceFactory,
    out_dir: &Path,
    config: &AnalysisConfig,
    progress: bool,
) -> Result<AnalysisOutput, AnalysisError> {
    let source = factory.open()?;
    let mut source: Box<dyn FrameSource> = if progress {
        Box::new(ProgressSource::new(source, kind))
    } else {
        source
    };

    match kind {
        AnalysisKind::Tracking => tracking_analysis(source.as_mut(), out_dir, config),
        AnalysisKind::Heatmap => heatmap_analysis(source.as_mut(), out_dir, config),
        AnalysisKind::Pose => pose_analysis(source.as_mut(), out_dir, config),
        AnalysisKind::Shot => shot_analysis(source.as_mut(), out_dir, config),
        AnalysisKind::Speed => speed_analysis(source.as_mut(), out_dir, config),
    }
}

/// Wraps a source with a per-analysis progress bar for interactive runs.
struct ProgressSource {
    inner: Box<dyn FrameSource>,
    bar: ProgressBar,
}

impl ProgressSource {
    fn new(inner: Box<dyn FrameSource>, kind: AnalysisKind) -> Self {
        let bar = match inner.info().frame_count {
            Some(total) => ProgressBar::new(total as u64),
            None => ProgressBar::new_spinner(),
        };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg:20} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, {eta})")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message(kind.display_name());
        Self { inner, bar }
    }
}

impl FrameSource for ProgressSource {
    fn info(&self) -> &CaptureInfo {
        self.inner.info()
    }

    fn next_frame(&mut self) -> Result<Option<FrameObservations>, AnalysisError> {
        let frame = self.inner.next_frame()?;
        match frame {
            Some(_) => self.bar.inc(1),
            None => self.bar.finish_and_clear(),
        }
        Ok(frame)
    }
}
