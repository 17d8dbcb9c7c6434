pub mod fits;
pub mod fits_writer;
pub mod store;

pub use store::{is_fits_path, FitsStore, FrameStore};
