#[allow(dead_code)]
mod common;

use approx::assert_abs_diff_eq;
use ndarray::Array2;

use calframe_core::calibration::{calibrate, provenance_entries, CalibrationSet};
use calframe_core::error::CalframeError;
use calframe_core::frame::{Frame, MasterFrame};

use common::{light, uniform};

fn master(h: usize, w: usize, value: f32, count: usize) -> MasterFrame {
    MasterFrame::new(uniform(h, w, value), count)
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

#[test]
fn test_calibrate_uniform_frames() {
    // (100 - 10 - (30 - 10)) / (60 - 10) = 70 / 50
    let science = uniform(3, 3, 100.0);
    let out = calibrate(
        &science,
        &master(3, 3, 10.0, 1),
        &master(3, 3, 30.0, 1),
        &master(3, 3, 60.0, 1),
    )
    .unwrap();
    for v in out.data.iter() {
        assert_abs_diff_eq!(*v, 1.4, epsilon = 1e-6);
    }
}

#[test]
fn test_calibrate_per_pixel_values() {
    let science =
        Frame::new(Array2::from_shape_vec((1, 3), vec![100.0f32, 200.0, 50.0]).unwrap());
    let bias = MasterFrame::new(
        Frame::new(Array2::from_shape_vec((1, 3), vec![10.0f32, 20.0, 0.0]).unwrap()),
        1,
    );
    let dark = MasterFrame::new(
        Frame::new(Array2::from_shape_vec((1, 3), vec![30.0f32, 20.0, 10.0]).unwrap()),
        1,
    );
    let flat = MasterFrame::new(
        Frame::new(Array2::from_shape_vec((1, 3), vec![60.0f32, 120.0, 20.0]).unwrap()),
        1,
    );

    let out = calibrate(&science, &bias, &dark, &flat).unwrap();
    assert_abs_diff_eq!(out.data[[0, 0]], 1.4, epsilon = 1e-6);
    assert_abs_diff_eq!(out.data[[0, 1]], 1.8, epsilon = 1e-6);
    assert_abs_diff_eq!(out.data[[0, 2]], 2.0, epsilon = 1e-6);
}

#[test]
fn test_calibrate_large_frame_uses_same_kernel() {
    // Above the parallel threshold.
    let science = uniform(300, 300, 100.0);
    let out = calibrate(
        &science,
        &master(300, 300, 10.0, 1),
        &master(300, 300, 30.0, 1),
        &master(300, 300, 60.0, 1),
    )
    .unwrap();
    assert_eq!(out.dim(), (300, 300));
    assert!(out.data.iter().all(|v| (v - 1.4).abs() < 1e-6));
}

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

#[test]
fn test_history_records_master_counts_in_order() {
    let science = uniform(2, 2, 100.0);
    let out = calibrate(
        &science,
        &master(2, 2, 10.0, 3),
        &master(2, 2, 30.0, 5),
        &master(2, 2, 60.0, 7),
    )
    .unwrap();
    assert_eq!(out.history, ["DARK: 5", "BIAS: 3", "FLAT: 7"]);
}

#[test]
fn test_provenance_entries_format() {
    assert_eq!(
        provenance_entries(5, 3, 7),
        ["DARK: 5".to_string(), "BIAS: 3".into(), "FLAT: 7".into()]
    );
}

#[test]
fn test_science_attributes_are_kept() {
    let science = light(100.0, "M 42", Some("R"));
    let set = CalibrationSet::new(master(4, 4, 10.0, 1), master(4, 4, 30.0, 1));
    let out = set.apply(&science, &master(4, 4, 60.0, 1)).unwrap();
    assert_eq!(out.info, science.info);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn test_flat_equal_to_bias_is_degenerate() {
    let science = uniform(2, 2, 100.0);
    let mut flat = master(2, 2, 60.0, 1);
    flat.frame.data[[0, 1]] = 10.0;

    let err = calibrate(
        &science,
        &master(2, 2, 10.0, 1),
        &master(2, 2, 30.0, 1),
        &flat,
    )
    .unwrap_err();
    assert!(matches!(err, CalframeError::DegenerateFlat { pixels: 1 }));
}

#[test]
fn test_master_shape_mismatch() {
    let science = uniform(4, 4, 100.0);
    let err = calibrate(
        &science,
        &master(4, 4, 10.0, 1),
        &master(4, 5, 30.0, 1),
        &master(4, 4, 60.0, 1),
    )
    .unwrap_err();
    match err {
        CalframeError::ShapeMismatch { expected, found } => {
            assert_eq!(expected, (4, 4));
            assert_eq!(found, (4, 5));
        }
        other => panic!("unexpected error: {other}"),
    }
}
