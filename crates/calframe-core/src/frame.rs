use std::fmt;
use std::str::FromStr;

use ndarray::Array2;

use crate::consts::DEFAULT_FILTER_TAG;

/// A single-plane image frame with its provenance attributes.
/// Pixel values are f32 in the frame's native units (ADU after BSCALE/BZERO).
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<f32>,
    pub info: FrameInfo,
    /// Calibration history log, oldest entry first.
    pub history: Vec<String>,
    /// Raw header records not covered by `info`, preserved across read/write.
    pub extra_cards: Vec<String>,
}

impl Frame {
    pub fn new(data: Array2<f32>) -> Self {
        Self {
            data,
            info: FrameInfo::default(),
            history: Vec::new(),
            extra_cards: Vec::new(),
        }
    }

    pub fn with_info(data: Array2<f32>, info: FrameInfo) -> Self {
        Self {
            info,
            ..Self::new(data)
        }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// (rows, columns)
    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn push_history(&mut self, entry: impl Into<String>) {
        self.history.push(entry.into());
    }
}

/// Header attributes the pipeline classifies frames by.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameInfo {
    /// `IMAGETYP`, e.g. LIGHT, DARK, BIAS, FLAT.
    pub image_type: Option<String>,
    /// `OBJECT`
    pub object: Option<String>,
    /// `DATE-OBS`, raw ISO timestamp.
    pub date_obs: Option<String>,
    pub filter: FilterTag,
}

impl FrameInfo {
    /// The `yyyy-mm-dd` part of `DATE-OBS`.
    pub fn capture_date(&self) -> Option<&str> {
        let date = self.date_obs.as_deref()?.split('T').next()?.trim();
        if date.is_empty() {
            None
        } else {
            Some(date)
        }
    }

    pub fn is_type(&self, image_type: &str) -> bool {
        self.image_type.as_deref() == Some(image_type)
    }
}

/// Optical filter in the light path when the frame was captured.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterTag {
    Named(String),
    #[default]
    Unfiltered,
}

impl FilterTag {
    /// Resolve a raw `FILTER` header value. Absent, blank and the default tag
    /// itself all mean "no filter".
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some(DEFAULT_FILTER_TAG) => Self::Unfiltered,
            Some(name) => Self::Named(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Unfiltered => DEFAULT_FILTER_TAG,
        }
    }

    pub fn is_unfiltered(&self) -> bool {
        matches!(self, Self::Unfiltered)
    }
}

impl fmt::Display for FilterTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterTag {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_header(Some(s)))
    }
}

/// A frame combined from `sample_count` raw frames.
#[derive(Clone, Debug)]
pub struct MasterFrame {
    pub frame: Frame,
    pub sample_count: usize,
}

impl MasterFrame {
    pub fn new(frame: Frame, sample_count: usize) -> Self {
        Self {
            frame,
            sample_count,
        }
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.frame.data
    }

    pub fn dim(&self) -> (usize, usize) {
        self.frame.dim()
    }
}
