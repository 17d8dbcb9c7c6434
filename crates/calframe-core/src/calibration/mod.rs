mod engine;

use std::sync::Arc;

use crate::error::Result;
use crate::frame::{Frame, MasterFrame};

pub use engine::{calibrate, provenance_entries};

/// Bias and dark masters shared by every science frame of a run.
#[derive(Clone, Debug)]
pub struct CalibrationSet {
    pub bias: Arc<MasterFrame>,
    pub dark: Arc<MasterFrame>,
}

impl CalibrationSet {
    pub fn new(bias: MasterFrame, dark: MasterFrame) -> Self {
        Self {
            bias: Arc::new(bias),
            dark: Arc::new(dark),
        }
    }

    /// Calibrate `science` against these masters and the given flat.
    pub fn apply(&self, science: &Frame, flat: &MasterFrame) -> Result<Frame> {
        calibrate(science, &self.bias, &self.dark, flat)
    }
}
