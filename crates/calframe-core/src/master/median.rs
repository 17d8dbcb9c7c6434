use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{CalframeError, Result};

/// Per-pixel median across a stack of equally sized planes.
///
/// Uses `select_nth_unstable` for O(n) median without full sort.
/// Parallelizes at the row level for images >= 256x256.
pub fn median_combine(planes: &[&Array2<f32>]) -> Result<Array2<f32>> {
    let first = planes.first().ok_or(CalframeError::EmptySequence)?;
    let (h, w) = first.dim();
    for plane in &planes[1..] {
        if plane.dim() != (h, w) {
            return Err(CalframeError::ShapeMismatch {
                expected: (h, w),
                found: plane.dim(),
            });
        }
    }

    let n = planes.len();
    let mut result = Array2::<f32>::zeros((h, w));

    if h * w >= PARALLEL_PIXEL_THRESHOLD && n > 1 {
        // Row-parallel: each row allocates its own pixel_values
        let rows: Vec<Vec<f32>> = (0..h)
            .into_par_iter()
            .map(|row| {
                let mut pixel_values = vec![0.0f32; n];
                let mut row_result = vec![0.0f32; w];
                for (col, out) in row_result.iter_mut().enumerate() {
                    for (value, plane) in pixel_values.iter_mut().zip(planes) {
                        *value = plane[[row, col]];
                    }
                    *out = compute_median(&mut pixel_values);
                }
                row_result
            })
            .collect();

        for (row, row_data) in rows.into_iter().enumerate() {
            for (col, val) in row_data.into_iter().enumerate() {
                result[[row, col]] = val;
            }
        }
    } else {
        let mut pixel_values = vec![0.0f32; n];
        for ((row, col), out) in result.indexed_iter_mut() {
            for (value, plane) in pixel_values.iter_mut().zip(planes) {
                *value = plane[[row, col]];
            }
            *out = compute_median(&mut pixel_values);
        }
    }

    Ok(result)
}

/// Median of `values`; even counts average the two middle samples.
/// Reorders `values` in place.
pub(crate) fn compute_median(values: &mut [f32]) -> f32 {
    let n = values.len();
    if n == 1 {
        values[0]
    } else if n % 2 == 1 {
        let mid = n / 2;
        *values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b)).1
    } else {
        let mid = n / 2;
        values.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
        values[..mid].select_nth_unstable_by(mid - 1, |a, b| a.total_cmp(b));
        (values[mid - 1] + values[mid]) / 2.0
    }
}
