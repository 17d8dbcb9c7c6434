use std::path::PathBuf;

use anyhow::{Context, Result};
use calframe_core::frame::FilterTag;
use calframe_core::io::fits_writer::write_fits;
use calframe_core::io::FitsStore;
use calframe_core::master::combine_folder;
use clap::Args;

use crate::summary::print_master_summary;

#[derive(Args)]
pub struct MasterArgs {
    /// Folder of raw frames to combine
    pub folder: PathBuf,

    /// Only combine frames taken through this filter ("C" for unfiltered)
    #[arg(long)]
    pub filter: Option<FilterTag>,

    /// Output FITS file
    #[arg(short, long, default_value = "master.fits")]
    pub output: PathBuf,
}

pub fn run(args: &MasterArgs) -> Result<()> {
    let master = combine_folder(&FitsStore, &args.folder, args.filter.as_ref())
        .with_context(|| format!("Failed to combine {}", args.folder.display()))?;

    write_fits(&args.output, &master.frame)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    print_master_summary(&args.folder, args.filter.as_ref(), &master, &args.output);
    Ok(())
}
