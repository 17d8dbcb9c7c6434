use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalframeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid FITS file: {0}")]
    InvalidFits(String),

    #[error("cfitsio error: {0}")]
    Fits(String),

    #[error("Empty frame sequence")]
    EmptySequence,

    #[error("Frame shape mismatch: expected {}x{}, found {}x{}", expected.0, expected.1, found.0, found.1)]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("No frames with filter {filter} found")]
    NoMatchingFrames { filter: String },

    #[error("Degenerate flat: {pixels} pixel(s) where flat - bias is zero or near zero")]
    DegenerateFlat { pixels: usize },

    #[error("Calibration produced {pixels} non-finite pixel(s)")]
    NonFiniteResult { pixels: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Filing error for {}: {reason}", path.display())]
    Filing { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, CalframeError>;
