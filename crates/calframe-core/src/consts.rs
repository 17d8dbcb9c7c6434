/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Tag used for frames that declare no filter ("clear").
pub const DEFAULT_FILTER_TAG: &str = "C";

/// Flat pixels with `|flat - bias|` at or below this value are treated as zero.
pub const FLAT_EPSILON: f32 = 1e-6;

/// FITS header record size in bytes.
pub const FITS_CARD_SIZE: usize = 80;

/// File extension of frames picked up from a folder.
pub const FITS_EXTENSION: &str = "fits";

/// Default value of the `IMAGETYP` keyword selecting science frames.
pub const DEFAULT_IMAGE_TYPE: &str = "LIGHT";

/// Default file-name suffix marking a filed frame.
pub const DEFAULT_FLAG: &str = "_CALIBRATED";

/// History entry written to every filed frame.
pub const CALIBRATED_HISTORY: &str = "CALIBRATED";

/// Date folder name for frames without `DATE-OBS`.
pub const UNDATED_FOLDER: &str = "undated";
