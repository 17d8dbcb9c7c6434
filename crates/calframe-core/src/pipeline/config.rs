use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_FLAG, DEFAULT_IMAGE_TYPE};
use crate::error::{CalframeError, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Folder scanned for science frames.
    pub source: PathBuf,
    /// Root of the filed hierarchy; relative paths are under `source`.
    pub destination: PathBuf,
    /// `IMAGETYP` value selecting the frames to calibrate.
    #[serde(default = "default_image_type")]
    pub image_type: String,
    /// Suffix appended to filed file names.
    #[serde(default = "default_flag")]
    pub flag: String,
    pub darks: PathBuf,
    pub biases: PathBuf,
    pub flats: PathBuf,
    /// Remove the source frame once its calibrated copy is filed.
    #[serde(default)]
    pub delete_source: bool,
    #[serde(default)]
    pub overwrite: OverwritePolicy,
    #[serde(default)]
    pub on_error: FailurePolicy,
    #[serde(default)]
    pub execution: ExecutionMode,
}

fn default_image_type() -> String {
    DEFAULT_IMAGE_TYPE.to_string()
}

fn default_flag() -> String {
    DEFAULT_FLAG.to_string()
}

impl PipelineConfig {
    /// Config with default policies for the given folders.
    pub fn new(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        darks: impl Into<PathBuf>,
        biases: impl Into<PathBuf>,
        flats: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            image_type: default_image_type(),
            flag: default_flag(),
            darks: darks.into(),
            biases: biases.into(),
            flats: flats.into(),
            delete_source: false,
            overwrite: OverwritePolicy::default(),
            on_error: FailurePolicy::default(),
            execution: ExecutionMode::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.image_type.trim().is_empty() {
            return Err(CalframeError::Config("image_type must not be empty".into()));
        }
        if self.flag.trim().is_empty() {
            return Err(CalframeError::Config(
                "flag must not be empty: filed frames would be picked up again".into(),
            ));
        }
        if self.flag.contains(['/', '\\']) {
            return Err(CalframeError::Config(format!(
                "flag {:?} must not contain path separators",
                self.flag
            )));
        }
        Ok(())
    }
}

/// What to do when the filed copy of a frame already exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverwritePolicy {
    #[default]
    Replace,
    Keep,
}

impl fmt::Display for OverwritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => write!(f, "Replace"),
            Self::Keep => write!(f, "Keep existing"),
        }
    }
}

/// How a combination or calibration error affects the rest of the run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop the run at the first failing frame.
    #[default]
    Abort,
    /// Record the frame as failed and continue with the next one.
    SkipFrame,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => write!(f, "Abort run"),
            Self::SkipFrame => write!(f, "Skip frame"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    #[default]
    Sequential,
    /// Build every needed flat first, then calibrate frames on the rayon pool.
    Parallel,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => write!(f, "Sequential"),
            Self::Parallel => write!(f, "Parallel"),
        }
    }
}
