use std::fs;
use std::path::Path;

use fitsio::images::{ImageDescription, ImageType};
use fitsio::{sys, FitsFile};

use crate::error::Result;
use crate::frame::Frame;
use crate::io::fits::{c_string, cfitsio_lock, check, fits_error, is_extra_keyword, record_keyword};

/// Write `frame` to `path` as a single-HDU FITS file with 32-bit float
/// pixels, replacing any existing file.
///
/// Text values longer than one card are written with CONTINUE cards, and
/// HISTORY entries wrap onto as many cards as they need.
pub fn write_fits(path: &Path, frame: &Frame) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }

    let (rows, cols) = frame.dim();
    let description = ImageDescription {
        data_type: ImageType::Float,
        dimensions: &[rows, cols],
    };

    let _lock = cfitsio_lock();
    let mut fptr = FitsFile::create(path)
        .with_custom_primary(&description)
        .open()
        .map_err(fits_error)?;
    let hdu = fptr.primary_hdu().map_err(fits_error)?;

    let info = &frame.info;
    let text_keys = [
        ("IMAGETYP", info.image_type.as_deref()),
        ("OBJECT", info.object.as_deref()),
        ("DATE-OBS", info.date_obs.as_deref()),
        ("FILTER", (!info.filter.is_unfiltered()).then(|| info.filter.as_str())),
    ];
    for (keyword, value) in text_keys {
        if let Some(value) = value {
            write_text_key(&mut fptr, keyword, value)?;
        }
    }

    // a CONTINUE card is only copied after the record it extends
    let mut continuing = false;
    for record in &frame.extra_cards {
        let keyword = record_keyword(record);
        let keep = match keyword.as_str() {
            "CONTINUE" => continuing,
            k => is_extra_keyword(k),
        };
        continuing = keep;
        if keep {
            write_record(&mut fptr, record)?;
        }
    }

    for entry in &frame.history {
        write_history(&mut fptr, entry)?;
    }

    let pixels: Vec<f32> = frame.data.iter().copied().collect();
    hdu.write_image(&mut fptr, &pixels).map_err(fits_error)?;
    Ok(())
}

fn write_text_key(fptr: &mut FitsFile, keyword: &str, value: &str) -> Result<()> {
    let raw = unsafe { fptr.as_raw() };
    let name = c_string(keyword)?;
    let value = c_string(value)?;
    let comment = c_string("")?;
    let mut status = 0;
    unsafe { sys::ffpkls(raw, name.as_ptr(), value.as_ptr(), comment.as_ptr(), &mut status) };
    check(status)
}

fn write_record(fptr: &mut FitsFile, record: &str) -> Result<()> {
    let raw = unsafe { fptr.as_raw() };
    let record = c_string(record)?;
    let mut status = 0;
    unsafe { sys::ffprec(raw, record.as_ptr(), &mut status) };
    check(status)
}

fn write_history(fptr: &mut FitsFile, entry: &str) -> Result<()> {
    let raw = unsafe { fptr.as_raw() };
    let entry = c_string(entry)?;
    let mut status = 0;
    unsafe { sys::ffphis(raw, entry.as_ptr(), &mut status) };
    check(status)
}
