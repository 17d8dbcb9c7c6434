use std::path::Path;

use crate::consts::FITS_EXTENSION;

/// `<stem><flag>.fits` for a source frame path.
pub fn flagged_file_name(path: &Path, flag: &str) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    Some(format!("{stem}{flag}.{FITS_EXTENSION}"))
}

/// Whether the file name already carries `flag`, i.e. it was filed before.
pub fn has_flag(path: &Path, flag: &str) -> bool {
    !flag.is_empty()
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.contains(flag))
}
