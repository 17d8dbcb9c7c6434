use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use calframe_core::io::FitsStore;
use calframe_core::pipeline::{
    run_pipeline_reported, ExecutionMode, FailurePolicy, OverwritePolicy, PipelineConfig,
};
use clap::Args;
use tracing::info;

use crate::progress::BarReporter;
use crate::summary::{print_pipeline_summary, print_run_summary};

#[derive(Args)]
pub struct RunArgs {
    /// Folder containing the science frames
    #[arg(required_unless_present = "config")]
    pub source: Option<PathBuf>,

    /// Pipeline config file (TOML); replaces every other option
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Root of the filed hierarchy, relative to the source folder unless absolute
    #[arg(short, long, default_value = "sorted")]
    pub destination: PathBuf,

    /// Folder of raw dark frames
    #[arg(long, required_unless_present = "config")]
    pub darks: Option<PathBuf>,

    /// Folder of raw bias frames
    #[arg(long, required_unless_present = "config")]
    pub biases: Option<PathBuf>,

    /// Folder of raw flat frames, any filter
    #[arg(long, required_unless_present = "config")]
    pub flats: Option<PathBuf>,

    /// IMAGETYP of the frames to calibrate
    #[arg(long, default_value = "LIGHT")]
    pub image_type: String,

    /// Suffix appended to filed file names
    #[arg(long, default_value = "_CALIBRATED")]
    pub flag: String,

    /// Delete each source frame once its calibrated copy is filed
    #[arg(long)]
    pub delete_source: bool,

    /// Keep already filed frames instead of replacing them
    #[arg(long)]
    pub keep_existing: bool,

    /// Record failing frames and continue instead of aborting the run
    #[arg(long)]
    pub skip_failed: bool,

    /// Calibrate frames concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Worker threads for the rayon pool (default: all cores)
    #[arg(long)]
    pub threads: Option<usize>,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let config = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        let config: PipelineConfig =
            toml::from_str(&contents).context("Invalid pipeline config")?;
        info!(path = %config_path.display(), "Loaded pipeline config");
        config
    } else {
        build_config_from_args(args)?
    };

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure the worker pool")?;
    }

    print_pipeline_summary(&config);

    let reporter = Arc::new(BarReporter::new()?);
    let summary = run_pipeline_reported(&config, &FitsStore, reporter.clone())
        .with_context(|| format!("Processing {} failed", config.source.display()))?;
    reporter.finish();

    print_run_summary(&summary);
    Ok(())
}

fn build_config_from_args(args: &RunArgs) -> Result<PipelineConfig> {
    let required = |value: &Option<PathBuf>, name: &str| {
        value
            .clone()
            .with_context(|| format!("--{name} is required without --config"))
    };

    let mut config = PipelineConfig::new(
        required(&args.source, "source")?,
        args.destination.clone(),
        required(&args.darks, "darks")?,
        required(&args.biases, "biases")?,
        required(&args.flats, "flats")?,
    );
    config.image_type = args.image_type.clone();
    config.flag = args.flag.clone();
    config.delete_source = args.delete_source;
    if args.keep_existing {
        config.overwrite = OverwritePolicy::Keep;
    }
    if args.skip_failed {
        config.on_error = FailurePolicy::SkipFrame;
    }
    if args.parallel {
        config.execution = ExecutionMode::Parallel;
    }
    Ok(config)
}
