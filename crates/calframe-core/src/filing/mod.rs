mod layout;
mod naming;

pub use layout::{destination_dir, destination_root, sanitize_component};
pub use naming::{flagged_file_name, has_flag};
