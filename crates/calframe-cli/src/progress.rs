use calframe_core::pipeline::{PipelineStage, ProgressReporter};
use indicatif::{ProgressBar, ProgressStyle};

/// Drives a single terminal progress bar through the pipeline stages.
pub struct BarReporter {
    pb: ProgressBar,
    bar_style: ProgressStyle,
    spinner_style: ProgressStyle,
}

impl BarReporter {
    pub fn new() -> anyhow::Result<Self> {
        let bar_style = ProgressStyle::default_bar()
            .template("{msg:20} [{bar:40}] {pos}/{len}")?
            .progress_chars("=> ");
        let spinner_style = ProgressStyle::default_spinner().template("{spinner} {msg}")?;
        Ok(Self {
            pb: ProgressBar::new(0),
            bar_style,
            spinner_style,
        })
    }

    pub fn finish(&self) {
        self.pb.finish_with_message("Done");
    }
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        match total_items {
            Some(total) => {
                self.pb.set_style(self.bar_style.clone());
                self.pb.set_length(total as u64);
            }
            None => {
                self.pb.set_style(self.spinner_style.clone());
                self.pb.enable_steady_tick(std::time::Duration::from_millis(100));
            }
        }
        self.pb.set_position(0);
        self.pb.set_message(stage.to_string());
    }

    fn advance(&self, items_done: usize) {
        self.pb.set_position(items_done as u64);
    }

    fn finish_stage(&self) {
        self.pb.disable_steady_tick();
    }
}
