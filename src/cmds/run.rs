/// # Gear Run Command
///
/// Run the full gear: download the multi-echo inputs, call meica.py and
/// compress its output directories.
///
/// ## Example
///
/// ```bash
/// # Inside the gear container
/// meica-gear run
///
/// # Somewhere else, printing the meica.py call only
/// meica-gear run --config ./config.json --output ./out --dry-run
/// ```

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;

use crate::errors::GearError;
use crate::gear::{self, DEFAULT_MEICA_PATH, DEFAULT_OUTPUT_DIR, GearOptions};
use crate::types::gear_config::DEFAULT_CONFIG_PATH;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the gear config.json
    #[arg(short, long, env = "GEAR_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Output directory (inputs are downloaded here and meica.py runs here)
    #[arg(short, long, env = "GEAR_OUTPUT", default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Path to meica.py
    #[arg(long, env = "MEICA_PATH", default_value = DEFAULT_MEICA_PATH)]
    pub meica: PathBuf,

    /// Download inputs and print the meica.py call without running it
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the gear and return the exit code of meica.py
pub fn run(args: RunArgs) -> Result<u8, GearError> {
    println!("{}", "Running MEICA gear...".bold().cyan());
    println!("  {} Config: {}", "•".cyan(), args.config.display().to_string().dimmed());
    println!("  {} Output: {}", "•".cyan(), args.output.display().to_string().dimmed());
    println!();

    let options = GearOptions {
        config_path: args.config,
        output_dir: args.output,
        meica: args.meica,
        dry_run: args.dry_run,
    };
    gear::run(&options)
}
