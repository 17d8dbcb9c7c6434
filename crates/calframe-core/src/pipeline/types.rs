use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use crate::frame::FilterTag;

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    CombiningDarks,
    CombiningBiases,
    Scanning,
    CombiningFlats,
    Calibrating,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CombiningDarks => write!(f, "Combining darks"),
            Self::CombiningBiases => write!(f, "Combining biases"),
            Self::Scanning => write!(f, "Scanning frames"),
            Self::CombiningFlats => write!(f, "Combining flats"),
            Self::Calibrating => write!(f, "Calibrating"),
        }
    }
}

/// Thread-safe progress reporting for the pipeline.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline stage has started. `total_items` is the number of
    /// work items in this stage (e.g., frame count), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when `run_pipeline` delegates.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// Why a file in the source folder was passed over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    NotFits,
    AlreadyFlagged,
    /// The filed copy exists and the overwrite policy keeps it.
    DestinationExists(PathBuf),
}

/// Why a FITS frame was left out of calibration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotProcessedReason {
    TypeMismatch(Option<String>),
    MissingObject,
}

/// Final state of one source file.
#[derive(Clone, Debug)]
pub enum FrameOutcome {
    Calibrated { output: PathBuf, filter: FilterTag },
    Skipped(SkipReason),
    NotProcessed(NotProcessedReason),
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedFrame {
    pub path: PathBuf,
    pub reason: String,
}

/// Totals and provenance of a finished run.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub not_processed: usize,
    pub failed: Vec<FailedFrame>,
    /// Calibrated output files in processing order.
    pub outputs: Vec<PathBuf>,
    /// Folders that received calibrated frames.
    pub destinations: BTreeSet<PathBuf>,
    pub dark_count: usize,
    pub bias_count: usize,
    /// Sample count of each flat master built during the run.
    pub flat_counts: BTreeMap<FilterTag, usize>,
}

impl RunSummary {
    pub(super) fn record(&mut self, path: PathBuf, outcome: FrameOutcome) {
        match outcome {
            FrameOutcome::Calibrated { output, .. } => {
                self.processed += 1;
                if let Some(parent) = output.parent() {
                    self.destinations.insert(parent.to_path_buf());
                }
                self.outputs.push(output);
            }
            FrameOutcome::Skipped(_) => self.skipped += 1,
            FrameOutcome::NotProcessed(_) => self.not_processed += 1,
            FrameOutcome::Failed(reason) => self.failed.push(FailedFrame { path, reason }),
        }
    }
}
