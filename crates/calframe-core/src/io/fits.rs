use std::ffi::{c_char, c_int, CStr, CString};
use std::fs;
use std::path::Path;
use std::ptr;
use std::sync::{Mutex, MutexGuard};

use fitsio::errors::check_status;
use fitsio::hdu::HduInfo;
use fitsio::images::ImageType;
use fitsio::{sys, FitsFile};
use ndarray::Array2;

use crate::consts::FITS_CARD_SIZE;
use crate::error::{CalframeError, Result};
use crate::frame::{FilterTag, Frame, FrameInfo};

/// Keywords describing the data layout; regenerated on write.
pub(crate) const STRUCTURAL_KEYWORDS: &[&str] = &[
    "SIMPLE", "BITPIX", "NAXIS", "NAXIS1", "NAXIS2", "BZERO", "BSCALE", "EXTEND", "END",
];

/// Keywords mapped onto [`FrameInfo`].
pub(crate) const INFO_KEYWORDS: &[&str] = &["IMAGETYP", "OBJECT", "DATE-OBS", "FILTER"];

/// Records dropped on read and not carried into `extra_cards`.
const DROPPED_KEYWORDS: &[&str] = &["", "COMMENT", "HISTORY", "LONGSTRN"];

/// cfitsio status for a keyword missing from the header.
const KEY_NO_EXIST: c_int = 202;

/// cfitsio keeps global state that is not safe to share between threads.
static CFITSIO: Mutex<()> = Mutex::new(());

pub(crate) fn cfitsio_lock() -> MutexGuard<'static, ()> {
    CFITSIO.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn fits_error(err: impl std::fmt::Display) -> CalframeError {
    CalframeError::Fits(err.to_string())
}

pub(crate) fn check(status: c_int) -> Result<()> {
    check_status(status).map_err(fits_error)
}

pub(crate) fn c_string(text: &str) -> Result<CString> {
    CString::new(text)
        .map_err(|_| CalframeError::InvalidFits(format!("NUL byte in header text {text:?}")))
}

/// Keyword of a raw header record: columns 1-8, trimmed.
pub(crate) fn record_keyword(record: &str) -> String {
    record.chars().take(8).collect::<String>().trim().to_string()
}

/// Records the reader keeps verbatim and the writer copies back.
pub(crate) fn is_extra_keyword(keyword: &str) -> bool {
    !STRUCTURAL_KEYWORDS.contains(&keyword)
        && !INFO_KEYWORDS.contains(&keyword)
        && !DROPPED_KEYWORDS.contains(&keyword)
        && keyword != "CONTINUE"
}

/// Primary HDU header.
#[derive(Clone, Debug)]
pub struct FitsHeader {
    /// Image dimensions as (rows, columns) = (NAXIS2, NAXIS1).
    pub dim: (usize, usize),
    pub bitpix: i64,
    pub info: FrameInfo,
    pub history: Vec<String>,
    /// Records neither structural nor part of `info`, verbatim.
    pub extra_cards: Vec<String>,
    /// Every header record in file order.
    pub records: Vec<String>,
}

impl FitsHeader {
    /// Bytes of pixel data the header declares.
    pub fn data_len(&self) -> Result<usize> {
        let (rows, cols) = self.dim;
        declared_data_len(rows, cols, self.bitpix).ok_or_else(|| {
            CalframeError::InvalidFits(format!(
                "image of {cols}x{rows} at BITPIX {} overflows the address space",
                self.bitpix
            ))
        })
    }
}

/// `rows * cols * |bitpix| / 8`, or `None` when that overflows `usize`.
pub fn declared_data_len(rows: usize, cols: usize, bitpix: i64) -> Option<usize> {
    let bytes = usize::try_from(bitpix.unsigned_abs() / 8).ok()?;
    rows.checked_mul(cols)?.checked_mul(bytes)
}

fn image_type_to_bitpix(image_type: &ImageType) -> i64 {
    match image_type {
        ImageType::UnsignedByte | ImageType::Byte => 8,
        ImageType::Short | ImageType::UnsignedShort => 16,
        ImageType::Long | ImageType::UnsignedLong => 32,
        ImageType::LongLong => 64,
        ImageType::Float => -32,
        ImageType::Double => -64,
    }
}

/// Parse the primary header without touching pixel data.
pub fn read_header(path: &Path) -> Result<FitsHeader> {
    let _lock = cfitsio_lock();
    let mut fptr = FitsFile::open(path).map_err(fits_error)?;
    header_of(&mut fptr)
}

/// Read the primary image and its header into a frame.
///
/// cfitsio applies BSCALE/BZERO and converts every BITPIX to f32.
pub fn read_frame(path: &Path) -> Result<Frame> {
    let file_len = fs::metadata(path)?.len();

    let _lock = cfitsio_lock();
    let mut fptr = FitsFile::open(path).map_err(fits_error)?;
    let header = header_of(&mut fptr)?;

    let needed = header.data_len()?;
    if u64::try_from(needed).map_or(true, |n| n > file_len) {
        return Err(CalframeError::InvalidFits(format!(
            "File truncated: header declares {needed} data bytes, file holds {file_len}"
        )));
    }

    let hdu = fptr.primary_hdu().map_err(fits_error)?;
    let pixels: Vec<f32> = hdu.read_image(&mut fptr).map_err(fits_error)?;
    let data = Array2::from_shape_vec(header.dim, pixels)
        .map_err(|e| CalframeError::InvalidFits(e.to_string()))?;

    Ok(Frame {
        data,
        info: header.info,
        history: header.history,
        extra_cards: header.extra_cards,
    })
}

fn header_of(fptr: &mut FitsFile) -> Result<FitsHeader> {
    let hdu = fptr.primary_hdu().map_err(fits_error)?;
    let (shape, bitpix) = match &hdu.info {
        HduInfo::ImageInfo { shape, image_type } => {
            (shape.clone(), image_type_to_bitpix(image_type))
        }
        _ => {
            return Err(CalframeError::InvalidFits(
                "primary HDU is not an image".into(),
            ))
        }
    };

    // shape is [NAXIS2, NAXIS1]
    let dim = match shape[..] {
        [rows, cols] if rows > 0 && cols > 0 => (rows, cols),
        [rows, cols] => {
            return Err(CalframeError::InvalidFits(format!(
                "invalid image dimensions {cols}x{rows}"
            )))
        }
        _ => {
            return Err(CalframeError::InvalidFits(format!(
                "expected a 2-D image, NAXIS = {}",
                shape.len()
            )))
        }
    };

    let info = FrameInfo {
        image_type: read_text_key(fptr, "IMAGETYP")?,
        object: read_text_key(fptr, "OBJECT")?,
        date_obs: read_text_key(fptr, "DATE-OBS")?,
        filter: FilterTag::from_header(read_text_key(fptr, "FILTER")?.as_deref()),
    };

    let records = read_records(fptr)?;
    let mut history = Vec::new();
    let mut extra_cards = Vec::new();
    // CONTINUE cards belong to the record before them
    let mut continuing = false;
    for record in &records {
        let keyword = record_keyword(record);
        match keyword.as_str() {
            "HISTORY" => {
                history.push(record.get(8..).unwrap_or_default().trim().to_string());
                continuing = false;
            }
            "CONTINUE" => {
                if continuing {
                    extra_cards.push(record.clone());
                }
            }
            k if is_extra_keyword(k) => {
                extra_cards.push(record.clone());
                continuing = true;
            }
            _ => continuing = false,
        }
    }

    Ok(FitsHeader {
        dim,
        bitpix,
        info,
        history,
        extra_cards,
        records,
    })
}

/// Every header record of the current HDU, trailing blanks removed.
fn read_records(fptr: &mut FitsFile) -> Result<Vec<String>> {
    let raw = unsafe { fptr.as_raw() };
    let mut status = 0;
    let mut count = 0;
    let mut more = 0;
    unsafe { sys::ffghsp(raw, &mut count, &mut more, &mut status) };
    check(status)?;

    let mut records = Vec::with_capacity(usize::try_from(count).unwrap_or_default());
    let mut buf = [0 as c_char; FITS_CARD_SIZE + 1];
    for index in 1..=count {
        unsafe { sys::ffgrec(raw, index, buf.as_mut_ptr(), &mut status) };
        check(status)?;
        let record = unsafe { CStr::from_ptr(buf.as_ptr()) };
        records.push(record.to_string_lossy().trim_end().to_string());
    }
    Ok(records)
}

/// Text value of `keyword`, joined across CONTINUE cards and trimmed.
/// Absent and blank values are `None`.
fn read_text_key(fptr: &mut FitsFile, keyword: &str) -> Result<Option<String>> {
    let raw = unsafe { fptr.as_raw() };
    let name = c_string(keyword)?;
    let mut value: *mut c_char = ptr::null_mut();
    let mut comment = [0 as c_char; FITS_CARD_SIZE + 1];
    let mut status = 0;
    unsafe {
        sys::ffgkls(
            raw,
            name.as_ptr(),
            &mut value,
            comment.as_mut_ptr(),
            &mut status,
        )
    };

    if status == KEY_NO_EXIST {
        return Ok(None);
    }
    if value.is_null() {
        check(status)?;
        return Ok(None);
    }

    let text = unsafe { CStr::from_ptr(value) }
        .to_string_lossy()
        .trim()
        .to_string();
    let mut free_status = 0;
    unsafe { sys::fffree(value.cast(), &mut free_status) };
    check(status)?;

    Ok((!text.is_empty()).then_some(text))
}
