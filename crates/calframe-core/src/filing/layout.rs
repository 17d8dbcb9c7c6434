use std::path::{Path, PathBuf};

use crate::consts::UNDATED_FOLDER;
use crate::error::{CalframeError, Result};
use crate::frame::FrameInfo;

/// Root of the filed hierarchy. A relative destination is taken relative to
/// the source folder.
pub fn destination_root(source: &Path, destination: &Path) -> PathBuf {
    if destination.is_absolute() {
        destination.to_path_buf()
    } else {
        source.join(destination)
    }
}

/// `<root>/<OBJECT>/<TYPE>/<DATE>/<FILTER>` for a frame.
///
/// `frame_path` is only used to report a frame without an object name.
pub fn destination_dir(
    root: &Path,
    info: &FrameInfo,
    image_type: &str,
    frame_path: &Path,
) -> Result<PathBuf> {
    let object = info.object.as_deref().ok_or_else(|| CalframeError::Filing {
        path: frame_path.to_path_buf(),
        reason: "frame has no OBJECT".into(),
    })?;
    let date = info.capture_date().unwrap_or(UNDATED_FOLDER);

    Ok(root
        .join(sanitize_component(object))
        .join(sanitize_component(image_type))
        .join(sanitize_component(date))
        .join(sanitize_component(info.filter.as_str())))
}

/// Make a header value safe to use as a single path component.
pub fn sanitize_component(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}
