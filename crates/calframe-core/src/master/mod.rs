pub mod builder;
pub mod cache;
pub mod median;

pub use builder::{combine, combine_folder, combine_paths};
pub use cache::MasterCache;
