#[allow(dead_code)]
mod common;

use std::fs;

use ndarray::array;
use tempfile::TempDir;

use calframe_core::error::CalframeError;
use calframe_core::frame::{FilterTag, Frame};
use calframe_core::io::fits::{read_frame, read_header};
use calframe_core::io::fits_writer::write_fits;
use calframe_core::io::{FitsStore, FrameStore};

use common::{build_fits, card, light, FITS_BLOCK_SIZE};

// ---------------------------------------------------------------------------
// Round trip through the filesystem
// ---------------------------------------------------------------------------

#[test]
fn test_write_then_read_preserves_pixels_and_attributes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("m42.fits");

    let mut frame = Frame::new(array![[1.5f32, -2.0, 3.25], [0.0, 1e6, -7.5]]);
    frame.info = light(0.0, "M 42", Some("Ha")).info;
    frame.push_history("CALIBRATED");
    frame.push_history("DARK: 5");
    frame.extra_cards.push(card("EXPTIME", "120.0"));
    frame
        .extra_cards
        .push("INSTRUME= 'ASI1600 '           / camera".to_string());

    FitsStore.write(&frame, &path).unwrap();
    let back = FitsStore.read(&path).unwrap();

    assert_eq!(back.data, frame.data);
    assert_eq!(back.info, frame.info);
    assert_eq!(back.history, ["CALIBRATED", "DARK: 5"]);
    assert!(back
        .extra_cards
        .iter()
        .any(|c| c.starts_with("EXPTIME") && c.contains("120.0")));
    assert!(back
        .extra_cards
        .iter()
        .any(|c| c.starts_with("INSTRUME") && c.contains("'ASI1600 '")));
}

#[test]
fn test_long_text_values_survive_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("long.fits");

    let object = "Sh2-129 Flying Bat nebula with the Ou4 Giant Squid outflow, wide mosaic";
    assert!(object.len() > 68);
    let mut frame = light(2.0, object, Some("OIII"));
    frame.push_history(format!("FLAT: {}", "x".repeat(100)));

    write_fits(&path, &frame).unwrap();
    let back = read_frame(&path).unwrap();

    assert_eq!(back.info.object.as_deref(), Some(object));
    assert_eq!(back.info.filter, FilterTag::Named("OIII".into()));
    // wrapped onto two HISTORY cards
    assert_eq!(back.history.concat(), format!("FLAT: {}", "x".repeat(100)));
}

#[test]
fn test_unfiltered_frame_writes_no_filter_card() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clear.fits");

    let frame = light(5.0, "M 31", None);
    write_fits(&path, &frame).unwrap();

    let header = read_header(&path).unwrap();
    assert!(!header.records.iter().any(|r| r.starts_with("FILTER")));
    assert_eq!(header.info.filter, FilterTag::Unfiltered);
    assert_eq!(header.bitpix, -32);
    assert_eq!(header.dim, (4, 4));
}

#[test]
fn test_write_replaces_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("again.fits");

    write_fits(&path, &light(1.0, "M 1", Some("R"))).unwrap();
    write_fits(&path, &light(7.0, "M 2", Some("G"))).unwrap();

    let back = read_frame(&path).unwrap();
    assert_eq!(back.info.object.as_deref(), Some("M 2"));
    assert!(back.data.iter().all(|&v| v == 7.0));
    assert_eq!(fs::metadata(&path).unwrap().len() % FITS_BLOCK_SIZE as u64, 0);
}

// ---------------------------------------------------------------------------
// Reading foreign files
// ---------------------------------------------------------------------------

#[test]
fn test_read_unsigned_16_bit_camera_frame() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("raw.fits");

    let cards = [
        card("SIMPLE", "T"),
        card("BITPIX", "16"),
        card("NAXIS", "2"),
        card("NAXIS1", "2"),
        card("NAXIS2", "2"),
        card("BZERO", "32768"),
        card("BSCALE", "1"),
        "IMAGETYP= 'LIGHT   '".to_string(),
        "OBJECT  = 'NGC 7000'".to_string(),
        "DATE-OBS= '2023-09-14T22:01:33.120'".to_string(),
        "FILTER  = 'C       '".to_string(),
        card("GAIN", "139"),
        "HISTORY acquired with a test fixture".to_string(),
    ];
    let mut data = Vec::new();
    for v in [-32768i16, -32767, 0, 32767] {
        data.extend_from_slice(&v.to_be_bytes());
    }
    fs::write(&path, build_fits(&cards, &data)).unwrap();

    let frame = FitsStore.read(&path).unwrap();
    assert_eq!(frame.data, array![[0.0f32, 1.0], [32768.0, 65535.0]]);
    assert_eq!(frame.info.image_type.as_deref(), Some("LIGHT"));
    assert_eq!(frame.info.object.as_deref(), Some("NGC 7000"));
    assert_eq!(frame.info.capture_date(), Some("2023-09-14"));
    assert_eq!(frame.info.filter, FilterTag::Unfiltered);
    assert_eq!(frame.history, ["acquired with a test fixture"]);
    assert_eq!(frame.extra_cards.len(), 1);
    assert!(frame.extra_cards[0].starts_with("GAIN"));

    let header = read_header(&path).unwrap();
    assert_eq!(header.bitpix, 16);
    assert_eq!(header.dim, (2, 2));
}

#[test]
fn test_read_double_precision_frame() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("f64.fits");

    let cards = [
        card("SIMPLE", "T"),
        card("BITPIX", "-64"),
        card("NAXIS", "2"),
        card("NAXIS1", "3"),
        card("NAXIS2", "1"),
    ];
    let mut data = Vec::new();
    for v in [0.5f64, -1.25, 1024.0] {
        data.extend_from_slice(&v.to_be_bytes());
    }
    fs::write(&path, build_fits(&cards, &data)).unwrap();

    let frame = FitsStore.read(&path).unwrap();
    assert_eq!(frame.data, array![[0.5f32, -1.25, 1024.0]]);
}

#[test]
fn test_read_info_does_not_need_pixel_data() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("header_only.fits");

    let cards = [
        card("SIMPLE", "T"),
        card("BITPIX", "16"),
        card("NAXIS", "2"),
        card("NAXIS1", "100"),
        card("NAXIS2", "100"),
        "FILTER  = 'R       '".to_string(),
    ];
    fs::write(&path, build_fits(&cards, &[])).unwrap();

    let info = FitsStore.read_info(&path).unwrap();
    assert_eq!(info.filter, FilterTag::Named("R".into()));
    assert!(matches!(
        FitsStore.read(&path),
        Err(CalframeError::InvalidFits(_))
    ));
}

#[test]
fn test_oversized_dimensions_are_an_error_not_a_panic() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hostile.fits");

    let cards = [
        card("SIMPLE", "T"),
        card("BITPIX", "-64"),
        card("NAXIS", "2"),
        card("NAXIS1", "4294967296"),
        card("NAXIS2", "4294967296"),
    ];
    fs::write(&path, build_fits(&cards, &[0u8; 64])).unwrap();

    assert!(FitsStore.read(&path).is_err());
}

#[test]
fn test_file_smaller_than_one_block_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short.fits");
    fs::write(&path, b"SIMPLE  =                    T").unwrap();
    assert!(read_header(&path).is_err());
    assert!(FitsStore.read_info(&path).is_err());
}

#[test]
fn test_three_dimensional_cube_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cube.fits");
    let cards = [
        card("SIMPLE", "T"),
        card("BITPIX", "8"),
        card("NAXIS", "3"),
        card("NAXIS1", "2"),
        card("NAXIS2", "2"),
        card("NAXIS3", "2"),
    ];
    fs::write(&path, build_fits(&cards, &[0u8; 8])).unwrap();
    assert!(matches!(
        FitsStore.read(&path),
        Err(CalframeError::InvalidFits(_))
    ));
}

#[test]
fn test_store_lists_files_sorted() {
    let dir = TempDir::new().unwrap();
    for name in ["b.fits", "a.fits", "notes.txt"] {
        fs::write(dir.path().join(name), b"x").unwrap();
    }
    fs::create_dir(dir.path().join("sub")).unwrap();

    let all = FitsStore.list(dir.path()).unwrap();
    let names: Vec<_> = all
        .iter()
        .map(|p| p.file_name().unwrap().to_str().unwrap())
        .collect();
    assert_eq!(names, ["a.fits", "b.fits", "notes.txt"]);
    assert_eq!(FitsStore.list_frames(dir.path()).unwrap().len(), 2);
}
