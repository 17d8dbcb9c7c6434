use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::calibration::CalibrationSet;
use crate::consts::CALIBRATED_HISTORY;
use crate::error::{CalframeError, Result};
use crate::filing::{destination_dir, destination_root, flagged_file_name, has_flag};
use crate::frame::{FilterTag, MasterFrame};
use crate::io::{is_fits_path, FrameStore};
use crate::master::{combine_folder, MasterCache};

use super::config::{ExecutionMode, FailurePolicy, OverwritePolicy, PipelineConfig};
use super::types::{
    FrameOutcome, NoOpReporter, NotProcessedReason, PipelineStage, ProgressReporter, RunSummary,
    SkipReason,
};

/// A science frame cleared for calibration.
struct Job {
    source: PathBuf,
    filter: FilterTag,
    output: PathBuf,
}

enum Plan {
    Settled(FrameOutcome),
    Calibrate(Job),
}

/// State of one pipeline run. Owns the bias/dark masters and the flat cache.
struct Run<'a> {
    config: &'a PipelineConfig,
    store: &'a dyn FrameStore,
    masters: CalibrationSet,
    flats: MasterCache,
    /// Filters whose flat could not be built, with the reason.
    failed_flats: Mutex<HashMap<FilterTag, String>>,
    dest_root: PathBuf,
}

/// Run the full processing pipeline with a thread-safe progress reporter.
///
/// Dark and bias masters are combined once up front; any failure there ends
/// the run. Each qualifying science frame is then calibrated against the flat
/// master of its filter, built on first use and reused afterwards, and filed
/// under the destination root.
pub fn run_pipeline_reported(
    config: &PipelineConfig,
    store: &dyn FrameStore,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<RunSummary> {
    config.validate()?;

    reporter.begin_stage(PipelineStage::CombiningDarks, None);
    let dark = combine_folder(store, &config.darks, None)?;
    reporter.finish_stage();
    info!(frames = dark.sample_count, "Dark master combined");

    reporter.begin_stage(PipelineStage::CombiningBiases, None);
    let bias = combine_folder(store, &config.biases, None)?;
    reporter.finish_stage();
    info!(frames = bias.sample_count, "Bias master combined");

    let mut summary = RunSummary {
        dark_count: dark.sample_count,
        bias_count: bias.sample_count,
        ..Default::default()
    };

    let run = Run {
        config,
        store,
        masters: CalibrationSet::new(bias, dark),
        flats: MasterCache::new(),
        failed_flats: Mutex::new(HashMap::new()),
        dest_root: destination_root(&config.source, &config.destination),
    };

    let entries = store.list(&config.source)?;
    info!(
        source = %config.source.display(),
        files = entries.len(),
        image_type = %config.image_type,
        execution = %config.execution,
        "Processing files"
    );

    match config.execution {
        ExecutionMode::Sequential => run.sequential(&entries, &mut summary, &reporter)?,
        ExecutionMode::Parallel => run.parallel(&entries, &mut summary, &reporter)?,
    }

    for tag in run.flats.filters() {
        if let Some(flat) = run.flats.get(&tag) {
            summary.flat_counts.insert(tag, flat.sample_count);
        }
    }

    info!(
        processed = summary.processed,
        skipped = summary.skipped,
        not_processed = summary.not_processed,
        failed = summary.failed.len(),
        "Processing finished"
    );
    Ok(summary)
}

/// Run the full processing pipeline without progress reporting.
pub fn run_pipeline(config: &PipelineConfig, store: &dyn FrameStore) -> Result<RunSummary> {
    run_pipeline_reported(config, store, Arc::new(NoOpReporter))
}

impl Run<'_> {
    /// Visit frames one at a time in listing order.
    fn sequential(
        &self,
        entries: &[PathBuf],
        summary: &mut RunSummary,
        reporter: &Arc<dyn ProgressReporter>,
    ) -> Result<()> {
        reporter.begin_stage(PipelineStage::Calibrating, Some(entries.len()));
        for (i, path) in entries.iter().enumerate() {
            let result = self.plan(path).and_then(|plan| match plan {
                Plan::Settled(outcome) => Ok(outcome),
                Plan::Calibrate(job) => self.run_job(&job),
            });
            let outcome = self.settle(path, result)?;
            summary.record(path.clone(), outcome);
            reporter.advance(i + 1);
        }
        reporter.finish_stage();
        Ok(())
    }

    /// Plan every frame, build every flat the run needs, then calibrate the
    /// frames on the rayon pool. Outcomes are recorded in listing order.
    fn parallel(
        &self,
        entries: &[PathBuf],
        summary: &mut RunSummary,
        reporter: &Arc<dyn ProgressReporter>,
    ) -> Result<()> {
        reporter.begin_stage(PipelineStage::Scanning, Some(entries.len()));
        let mut outcomes: Vec<Option<FrameOutcome>> = Vec::with_capacity(entries.len());
        let mut jobs: Vec<(usize, Job)> = Vec::new();
        for (i, path) in entries.iter().enumerate() {
            match self.plan(path) {
                Ok(Plan::Calibrate(job)) => {
                    outcomes.push(None);
                    jobs.push((i, job));
                }
                Ok(Plan::Settled(outcome)) => outcomes.push(Some(outcome)),
                Err(e) => outcomes.push(Some(self.settle(path, Err(e))?)),
            }
            reporter.advance(i + 1);
        }
        reporter.finish_stage();

        let mut needed: Vec<&FilterTag> = Vec::new();
        for (_, job) in &jobs {
            if !needed.contains(&&job.filter) {
                needed.push(&job.filter);
            }
        }
        reporter.begin_stage(PipelineStage::CombiningFlats, Some(needed.len()));
        for (i, tag) in needed.into_iter().enumerate() {
            if let Err(e) = self.flat_for(tag) {
                if self.config.on_error == FailurePolicy::Abort {
                    return Err(e);
                }
            }
            reporter.advance(i + 1);
        }
        reporter.finish_stage();

        reporter.begin_stage(PipelineStage::Calibrating, Some(jobs.len()));
        let done = AtomicUsize::new(0);
        let results: Vec<(usize, Result<FrameOutcome>)> = jobs
            .par_iter()
            .map(|(i, job)| {
                let result = self.run_job(job);
                reporter.advance(done.fetch_add(1, Ordering::Relaxed) + 1);
                (*i, result)
            })
            .collect();
        reporter.finish_stage();

        for (i, result) in results {
            outcomes[i] = Some(self.settle(&entries[i], result)?);
        }
        for (path, outcome) in entries.iter().zip(outcomes) {
            if let Some(outcome) = outcome {
                summary.record(path.clone(), outcome);
            }
        }
        Ok(())
    }

    /// Classify a source file without decoding its pixels.
    fn plan(&self, path: &Path) -> Result<Plan> {
        if !is_fits_path(path) {
            return Ok(Plan::Settled(FrameOutcome::Skipped(SkipReason::NotFits)));
        }
        if has_flag(path, &self.config.flag) {
            return Ok(Plan::Settled(FrameOutcome::Skipped(
                SkipReason::AlreadyFlagged,
            )));
        }

        let info = self.store.read_info(path)?;
        if !info.is_type(&self.config.image_type) {
            info!(file = %path.display(), image_type = ?info.image_type, "File not processed");
            return Ok(Plan::Settled(FrameOutcome::NotProcessed(
                NotProcessedReason::TypeMismatch(info.image_type),
            )));
        }
        if info.object.is_none() {
            info!(file = %path.display(), "File not processed: no OBJECT");
            return Ok(Plan::Settled(FrameOutcome::NotProcessed(
                NotProcessedReason::MissingObject,
            )));
        }

        let dir = destination_dir(&self.dest_root, &info, &self.config.image_type, path)?;
        let name =
            flagged_file_name(path, &self.config.flag).ok_or_else(|| CalframeError::Filing {
                path: path.to_path_buf(),
                reason: "file name is not valid UTF-8".into(),
            })?;
        let output = dir.join(name);

        if self.config.overwrite == OverwritePolicy::Keep && self.store.exists(&output) {
            info!(file = %output.display(), "Already filed, keeping existing file");
            return Ok(Plan::Settled(FrameOutcome::Skipped(
                SkipReason::DestinationExists(output),
            )));
        }

        Ok(Plan::Calibrate(Job {
            source: path.to_path_buf(),
            filter: info.filter,
            output,
        }))
    }

    /// Flat master for `filter`, combined on first request.
    fn flat_for(&self, filter: &FilterTag) -> Result<Arc<MasterFrame>> {
        let result = self.flats.get_or_build(filter, || {
            info!(filter = %filter, "Combining (median) flats");
            combine_folder(self.store, &self.config.flats, Some(filter))
        });
        if let Err(ref e) = result {
            self.failed_flats
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(filter.clone(), e.to_string());
        }
        result
    }

    fn run_job(&self, job: &Job) -> Result<FrameOutcome> {
        let known_failure = self
            .failed_flats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&job.filter)
            .cloned();
        if let Some(reason) = known_failure {
            return Ok(FrameOutcome::Failed(reason));
        }

        let flat = self.flat_for(&job.filter)?;

        let mut science = self.store.read(&job.source)?;
        science.push_history(CALIBRATED_HISTORY);
        let calibrated = self.masters.apply(&science, &flat)?;

        if let Some(dir) = job.output.parent() {
            self.store.create_dir_all(dir)?;
        }
        self.store.write(&calibrated, &job.output)?;
        if self.config.delete_source {
            self.store.remove(&job.source)?;
            debug!(file = %job.source.display(), "Source deleted");
        }

        info!(
            source = %job.source.display(),
            output = %job.output.display(),
            filter = %job.filter,
            "File calibrated"
        );
        Ok(FrameOutcome::Calibrated {
            output: job.output.clone(),
            filter: job.filter.clone(),
        })
    }

    /// Apply the failure policy to a frame's result.
    fn settle(&self, path: &Path, result: Result<FrameOutcome>) -> Result<FrameOutcome> {
        match (result, self.config.on_error) {
            (Ok(outcome), _) => Ok(outcome),
            (Err(e), FailurePolicy::Abort) => Err(e),
            (Err(e), FailurePolicy::SkipFrame) => {
                warn!(file = %path.display(), error = %e, "Frame failed, continuing");
                Ok(FrameOutcome::Failed(e.to_string()))
            }
        }
    }
}
