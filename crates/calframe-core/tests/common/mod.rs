use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ndarray::Array2;

use calframe_core::consts::FITS_CARD_SIZE;
use calframe_core::error::{CalframeError, Result};
use calframe_core::frame::{FilterTag, Frame, FrameInfo};
use calframe_core::io::FrameStore;

/// Uniform frame of the given shape.
pub fn uniform(h: usize, w: usize, value: f32) -> Frame {
    Frame::new(Array2::from_elem((h, w), value))
}

/// Uniform frame carrying header attributes.
pub fn tagged(
    value: f32,
    image_type: &str,
    object: Option<&str>,
    date_obs: Option<&str>,
    filter: Option<&str>,
) -> Frame {
    let info = FrameInfo {
        image_type: Some(image_type.to_string()),
        object: object.map(str::to_string),
        date_obs: date_obs.map(str::to_string),
        filter: FilterTag::from_header(filter),
    };
    Frame::with_info(Array2::from_elem((4, 4), value), info)
}

pub fn light(value: f32, object: &str, filter: Option<&str>) -> Frame {
    tagged(
        value,
        "LIGHT",
        Some(object),
        Some("2024-01-05T21:14:07"),
        filter,
    )
}

pub fn flat(value: f32, filter: Option<&str>) -> Frame {
    tagged(value, "FLAT", None, None, filter)
}

/// FITS logical record size in bytes.
pub const FITS_BLOCK_SIZE: usize = 2880;

/// Fixed-format header card.
pub fn card(keyword: &str, value: &str) -> String {
    format!("{:<8}= {:>20}", keyword, value)
}

/// Assemble a raw FITS file from header cards (without END) and big-endian
/// pixel bytes.
pub fn build_fits(cards: &[String], data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    for c in cards {
        buf.extend_from_slice(format!("{:<80}", c).as_bytes());
    }
    buf.extend_from_slice(format!("{:<80}", "END").as_bytes());
    let pad = (FITS_BLOCK_SIZE - buf.len() % FITS_BLOCK_SIZE) % FITS_BLOCK_SIZE;
    buf.extend(std::iter::repeat(b' ').take(pad));
    assert_eq!(buf.len() % FITS_CARD_SIZE, 0);

    buf.extend_from_slice(data);
    let pad = (FITS_BLOCK_SIZE - data.len() % FITS_BLOCK_SIZE) % FITS_BLOCK_SIZE;
    buf.extend(std::iter::repeat(0u8).take(pad));
    buf
}

/// In-memory [`FrameStore`]. Non-frame files can be registered with
/// [`MemoryStore::touch`].
#[derive(Default)]
pub struct MemoryStore {
    frames: Mutex<BTreeMap<PathBuf, Frame>>,
    others: Mutex<Vec<PathBuf>>,
    reads: Mutex<Vec<PathBuf>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, path: impl Into<PathBuf>, frame: Frame) {
        self.frames.lock().unwrap().insert(path.into(), frame);
    }

    pub fn touch(&self, path: impl Into<PathBuf>) {
        self.others.lock().unwrap().push(path.into());
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<Frame> {
        self.frames.lock().unwrap().get(path.as_ref()).cloned()
    }

    /// Number of full pixel reads of `path`.
    pub fn read_count(&self, path: impl AsRef<Path>) -> usize {
        self.reads
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.as_path() == path.as_ref())
            .count()
    }

    fn missing(path: &Path) -> CalframeError {
        CalframeError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} not found", path.display()),
        ))
    }
}

impl FrameStore for MemoryStore {
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = self
            .frames
            .lock()
            .unwrap()
            .keys()
            .chain(self.others.lock().unwrap().iter())
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect();
        files.sort();
        Ok(files)
    }

    fn read_info(&self, path: &Path) -> Result<FrameInfo> {
        self.get(path)
            .map(|f| f.info)
            .ok_or_else(|| Self::missing(path))
    }

    fn read(&self, path: &Path) -> Result<Frame> {
        self.reads.lock().unwrap().push(path.to_path_buf());
        self.get(path).ok_or_else(|| Self::missing(path))
    }

    fn write(&self, frame: &Frame, path: &Path) -> Result<()> {
        self.put(path, frame.clone());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.frames.lock().unwrap().contains_key(path)
            || self.others.lock().unwrap().iter().any(|p| p == path)
    }

    fn create_dir_all(&self, _dir: &Path) -> Result<()> {
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        self.frames
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| Self::missing(path))
    }
}
