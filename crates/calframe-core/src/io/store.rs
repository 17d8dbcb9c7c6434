use std::fs;
use std::path::{Path, PathBuf};

use crate::consts::FITS_EXTENSION;
use crate::error::Result;
use crate::frame::{Frame, FrameInfo};

use super::fits::{read_frame, read_header};
use super::fits_writer::write_fits;

/// Durable storage the pipeline reads raw frames from and files calibrated
/// frames into.
pub trait FrameStore: Send + Sync {
    /// Files directly inside `dir`, sorted by file name.
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Header attributes only; pixel data is not decoded.
    fn read_info(&self, path: &Path) -> Result<FrameInfo>;

    fn read(&self, path: &Path) -> Result<Frame>;

    fn write(&self, frame: &Frame, path: &Path) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;

    fn create_dir_all(&self, dir: &Path) -> Result<()>;

    fn remove(&self, path: &Path) -> Result<()>;

    /// Frame files inside `dir` (those with the FITS extension).
    fn list_frames(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        Ok(self
            .list(dir)?
            .into_iter()
            .filter(|p| is_fits_path(p))
            .collect())
    }
}

pub fn is_fits_path(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(FITS_EXTENSION)
}

/// [`FrameStore`] over FITS files on the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FitsStore;

impl FrameStore for FitsStore {
    fn list(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    fn read_info(&self, path: &Path) -> Result<FrameInfo> {
        Ok(read_header(path)?.info)
    }

    fn read(&self, path: &Path) -> Result<Frame> {
        read_frame(path)
    }

    fn write(&self, frame: &Frame, path: &Path) -> Result<()> {
        write_fits(path, frame)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        fs::remove_file(path)?;
        Ok(())
    }
}
