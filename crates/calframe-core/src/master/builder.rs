use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{CalframeError, Result};
use crate::frame::{FilterTag, Frame, MasterFrame};
use crate::io::FrameStore;

use super::median::median_combine;

/// Median-combine `frames` into a master frame.
///
/// With `filter`, only frames carrying that filter tag take part and the
/// returned sample count is the number of frames actually used. The master
/// inherits the header attributes of the first frame used.
pub fn combine(frames: &[Frame], filter: Option<&FilterTag>) -> Result<MasterFrame> {
    if frames.is_empty() {
        return Err(CalframeError::EmptySequence);
    }

    let included: Vec<&Frame> = frames
        .iter()
        .filter(|f| filter.map_or(true, |tag| f.info.filter == *tag))
        .collect();

    let Some(first) = included.first() else {
        // Only reachable with a filter: an unfiltered request includes everything.
        return Err(no_matching(filter));
    };

    let planes: Vec<_> = included.iter().map(|f| &f.data).collect();
    let data = median_combine(&planes)?;

    let mut info = first.info.clone();
    if let Some(tag) = filter {
        info.filter = tag.clone();
    }

    debug!(
        used = included.len(),
        offered = frames.len(),
        filter = %filter.map(FilterTag::as_str).unwrap_or("*"),
        "Median-combined frames"
    );
    Ok(MasterFrame::new(Frame::with_info(data, info), included.len()))
}

/// Load `paths` through `store` and median-combine them.
///
/// With `filter`, headers are inspected first and only the matching frames'
/// pixel data is decoded.
pub fn combine_paths(
    store: &dyn FrameStore,
    paths: &[PathBuf],
    filter: Option<&FilterTag>,
) -> Result<MasterFrame> {
    if paths.is_empty() {
        return Err(CalframeError::EmptySequence);
    }

    let selected: Vec<&PathBuf> = match filter {
        Some(tag) => {
            let mut selected = Vec::new();
            for path in paths {
                if store.read_info(path)?.filter == *tag {
                    debug!(path = %path.display(), filter = %tag, "Added to stack");
                    selected.push(path);
                }
            }
            selected
        }
        None => paths.iter().collect(),
    };

    if selected.is_empty() {
        return Err(no_matching(filter));
    }

    let frames = selected
        .iter()
        .map(|p| store.read(p))
        .collect::<Result<Vec<_>>>()?;
    combine(&frames, filter)
}

/// Median-combine every frame file in `dir`.
pub fn combine_folder(
    store: &dyn FrameStore,
    dir: &Path,
    filter: Option<&FilterTag>,
) -> Result<MasterFrame> {
    let paths = store.list_frames(dir)?;
    info!(
        folder = %dir.display(),
        files = paths.len(),
        "Combining (median) frames"
    );
    combine_paths(store, &paths, filter)
}

fn no_matching(filter: Option<&FilterTag>) -> CalframeError {
    CalframeError::NoMatchingFrames {
        filter: filter.map(FilterTag::to_string).unwrap_or_default(),
    }
}
