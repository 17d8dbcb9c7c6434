use std::path::PathBuf;

use anyhow::{Context, Result};
use calframe_core::io::fits::read_header;
use clap::Args;

#[derive(Args)]
pub struct InfoArgs {
    /// Input FITS file
    pub file: PathBuf,

    /// Also list every header record
    #[arg(long)]
    pub all: bool,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let header = read_header(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let info = &header.info;
    let (height, width) = header.dim;

    println!("File:        {}", args.file.display());
    println!("Dimensions:  {}x{}", width, height);
    println!("BITPIX:      {}", header.bitpix);
    println!(
        "Type:        {}",
        info.image_type.as_deref().unwrap_or("(none)")
    );
    println!("Object:      {}", info.object.as_deref().unwrap_or("(none)"));
    println!(
        "Date:        {}",
        info.date_obs.as_deref().unwrap_or("(none)")
    );
    println!("Filter:      {}", info.filter);

    if !header.history.is_empty() {
        println!("History:");
        for entry in &header.history {
            println!("  {}", entry);
        }
    }

    if args.all {
        println!("Header:");
        for record in &header.records {
            println!("  {}", record);
        }
    }

    Ok(())
}
