use ndarray::{Array2, Zip};

use crate::consts::{FLAT_EPSILON, PARALLEL_PIXEL_THRESHOLD};
use crate::error::{CalframeError, Result};
use crate::frame::{Frame, MasterFrame};

/// Apply bias/dark/flat correction to a science frame.
///
/// Per pixel: `(science - bias - (dark - bias)) / (flat - bias)`.
///
/// The returned frame keeps the science frame's attributes and history and
/// appends `DARK: n`, `BIAS: n`, `FLAT: n` with the sample count of each
/// master. Fails with `ShapeMismatch` if any master differs in size, with
/// `DegenerateFlat` if `flat - bias` is zero or near zero anywhere, and with
/// `NonFiniteResult` if the arithmetic yields NaN or infinity.
pub fn calibrate(
    science: &Frame,
    bias: &MasterFrame,
    dark: &MasterFrame,
    flat: &MasterFrame,
) -> Result<Frame> {
    let dim = science.dim();
    for master in [bias, dark, flat] {
        if master.dim() != dim {
            return Err(CalframeError::ShapeMismatch {
                expected: dim,
                found: master.dim(),
            });
        }
    }

    let degenerate = Zip::from(flat.data())
        .and(bias.data())
        .fold(0usize, |acc, &f, &b| {
            acc + usize::from((f - b).abs() <= FLAT_EPSILON)
        });
    if degenerate > 0 {
        return Err(CalframeError::DegenerateFlat { pixels: degenerate });
    }

    let kernel = |out: &mut f32, &s: &f32, &b: &f32, &d: &f32, &f: &f32| {
        *out = (s - b - (d - b)) / (f - b);
    };
    let mut data = Array2::<f32>::zeros(dim);
    let zip = Zip::from(&mut data)
        .and(&science.data)
        .and(bias.data())
        .and(dark.data())
        .and(flat.data());
    if dim.0 * dim.1 >= PARALLEL_PIXEL_THRESHOLD {
        zip.par_for_each(kernel);
    } else {
        zip.for_each(kernel);
    }

    let non_finite = data.iter().filter(|v| !v.is_finite()).count();
    if non_finite > 0 {
        return Err(CalframeError::NonFiniteResult { pixels: non_finite });
    }

    let mut calibrated = Frame {
        data,
        info: science.info.clone(),
        history: science.history.clone(),
        extra_cards: science.extra_cards.clone(),
    };
    calibrated.history.extend(provenance_entries(
        dark.sample_count,
        bias.sample_count,
        flat.sample_count,
    ));
    Ok(calibrated)
}

/// History entries recording how many raw frames went into each master.
pub fn provenance_entries(
    dark_count: usize,
    bias_count: usize,
    flat_count: usize,
) -> [String; 3] {
    [
        format!("DARK: {dark_count}"),
        format!("BIAS: {bias_count}"),
        format!("FLAT: {flat_count}"),
    ]
}
