/// # Zip Command
///
/// Compress one directory the same way the gear compresses its outputs.
///
/// ## Example
///
/// ```bash
/// # Writes ./out/run1.zip with entries run1/...
/// meica-gear zip ./out/run1
///
/// # Flat entries, no compression
/// meica-gear zip ./out/run1 -o run1-flat.zip --no-top-dir --store
/// ```

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;

use crate::archive::{ArchiveJob, Compression};
use crate::errors::GearError;
use crate::utils::{PrintOp, Utils};

/// Arguments for the zip command
#[derive(Args, Debug)]
pub struct ZipArgs {
    /// Directory to compress
    pub dir: PathBuf,

    /// Output archive (default: <dir>.zip)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Do not prefix entries with the directory's own name
    #[arg(long)]
    pub no_top_dir: bool,

    /// Store entries without compression
    #[arg(long)]
    pub store: bool,
}

pub fn run(args: ZipArgs) -> Result<u8, GearError> {
    let mut job = ArchiveJob::new(&args.dir)
        .include_top_dir(!args.no_top_dir)
        .compression(Compression::from(!args.store));
    if let Some(out) = &args.output {
        job = job.destination(out);
    }

    let dest = job.destination_path();
    let existed = dest.exists();
    let summary = job.run()?;

    let op = if existed { PrintOp::Update } else { PrintOp::Create { is_dir: false } };
    Utils::print_status(&dest.display().to_string(), op);
    println!(
        "{} Archived {} files and {} empty directories",
        "✓".green().bold(),
        summary.files,
        summary.directories
    );
    Ok(0)
}
